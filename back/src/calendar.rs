use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, PoisonError, RwLock,
    },
    time::Duration,
};

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use todo_api::v1::CalendarStatus;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::config::CalendarConfig;

/// A finished todo, as handed to the calendar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Completion {
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub description: String,
}

/// Receives completion notices from the todo store.
///
/// Implementations must return promptly; the store calls this while the
/// caller still holds the store lock.
pub trait CompletionNotifier: Send + Sync + fmt::Debug {
    fn notify_completion(&self, notice: &Completion) -> bool;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopNotifier;

impl CompletionNotifier for NoopNotifier {
    fn notify_completion(&self, _notice: &Completion) -> bool {
        true
    }
}

/// Connection state of the calendar integration, shared by the handlers
/// and the background worker.
#[derive(Debug, Default)]
pub struct Calendar {
    enabled: AtomicBool,
    client: RwLock<Option<CalendarClient>>,
}

impl Calendar {
    pub fn new(client: Option<CalendarClient>, enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            client: RwLock::new(client),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Flips the enabled flag and returns the new value.
    pub fn toggle_enabled(&self) -> bool {
        !self.enabled.fetch_xor(true, Ordering::Relaxed)
    }

    pub fn is_connected(&self) -> bool {
        self.client
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn client(&self) -> Option<CalendarClient> {
        self.client
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn disconnect(&self) {
        self.enabled.store(false, Ordering::Relaxed);
        *self.client.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Forwards notices to the calendar worker without waiting on it.
#[derive(Clone, Debug)]
pub struct ChannelNotifier {
    calendar: Arc<Calendar>,
    sender: mpsc::UnboundedSender<Completion>,
}

impl ChannelNotifier {
    pub fn new(calendar: Arc<Calendar>, sender: mpsc::UnboundedSender<Completion>) -> Self {
        Self { calendar, sender }
    }
}

impl CompletionNotifier for ChannelNotifier {
    fn notify_completion(&self, notice: &Completion) -> bool {
        if !self.calendar.is_enabled() || !self.calendar.is_connected() {
            return true;
        }

        self.sender.send(notice.clone()).is_ok()
    }
}

pub fn spawn_worker(calendar: Arc<Calendar>, mut notices: mpsc::UnboundedReceiver<Completion>) {
    tokio::spawn(async move {
        while let Some(notice) = notices.recv().await {
            let Some(client) = calendar.client() else {
                continue;
            };

            match client.create_event(&notice).await {
                Ok(()) => info!(title = %notice.title, "created calendar event"),
                Err(err) => error!(title = %notice.title, "Failed to create calendar event: {:?}", err),
            }
        }
    });
}

#[derive(Clone)]
pub struct CalendarClient {
    http: reqwest::Client,
    config: CalendarConfig,
}

impl fmt::Debug for CalendarClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalendarClient")
            .field("api_base", &self.config.api_base)
            .field("calendar_id", &self.config.calendar_id)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Event<'a> {
    summary: String,
    description: String,
    start: EventTime<'a>,
    end: EventTime<'a>,
    color_id: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EventTime<'a> {
    date_time: String,
    time_zone: &'a str,
}

#[derive(Debug, Deserialize)]
struct CalendarList {
    #[serde(default)]
    items: Vec<CalendarListEntry>,
}

#[derive(Debug, Deserialize)]
struct CalendarListEntry {
    id: String,
    summary: Option<String>,
    #[serde(default)]
    primary: bool,
}

impl CalendarClient {
    pub fn new(config: CalendarConfig) -> eyre::Result<Self> {
        // the worker sends one event at a time, a hung call would stall the queue
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { http, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_base.trim_end_matches('/'), path)
    }

    fn event<'a>(&'a self, notice: &Completion) -> Event<'a> {
        let duration = format_duration(notice.end_time - notice.start_time);

        Event {
            summary: format!("Todo Completed: {}", notice.title),
            description: format!("{}\n\nDuration: {}", notice.description, duration),
            start: EventTime {
                date_time: notice.start_time.to_rfc3339(),
                time_zone: &self.config.time_zone,
            },
            end: EventTime {
                date_time: notice.end_time.to_rfc3339(),
                time_zone: &self.config.time_zone,
            },
            // green
            color_id: "2",
        }
    }

    pub async fn create_event(&self, notice: &Completion) -> eyre::Result<()> {
        let url = self.url(&format!("calendars/{}/events", self.config.calendar_id));

        self.http
            .post(url)
            .bearer_auth(&self.config.access_token)
            .json(&self.event(notice))
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }

    pub async fn test_connection(&self) -> CalendarStatus {
        match self.primary_calendar().await {
            Ok(Some(entry)) => CalendarStatus {
                connected: true,
                calendar_name: Some(
                    entry
                        .summary
                        .unwrap_or_else(|| String::from("Primary Calendar")),
                ),
                calendar_id: Some(entry.id),
                error: None,
            },
            Ok(None) => CalendarStatus::disconnected("No primary calendar found"),
            Err(err) => CalendarStatus::disconnected(format!("Connection failed: {err}")),
        }
    }

    async fn primary_calendar(&self) -> eyre::Result<Option<CalendarListEntry>> {
        let list: CalendarList = self
            .http
            .get(self.url("users/me/calendarList"))
            .bearer_auth(&self.config.access_token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(list.items.into_iter().find(|entry| entry.primary))
    }
}

pub fn format_duration(duration: TimeDelta) -> String {
    let seconds = duration.num_seconds().max(0);

    if seconds < 60 {
        return format!("{seconds} seconds");
    }
    if seconds < 3600 {
        return format!("{} minutes", seconds / 60);
    }
    if seconds < 86400 {
        let (hours, minutes) = (seconds / 3600, seconds % 3600 / 60);
        return match minutes {
            0 => format!("{hours} hours"),
            _ => format!("{hours} hours, {minutes} minutes"),
        };
    }

    let (days, hours) = (seconds / 86400, seconds % 86400 / 3600);
    match hours {
        0 => format!("{days} days"),
        _ => format!("{days} days, {hours} hours"),
    }
}
