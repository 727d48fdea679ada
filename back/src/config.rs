use std::{
    fs, io,
    net::{IpAddr, Ipv4Addr},
    path::{Path, PathBuf},
};

use clap::Parser;
use serde::Deserialize;
use todo_api::v1::Theme;

const PORT: u16 = 7890;
const CONFIG_FILE: &str = "config.ron";
const GOOGLE_CALENDAR_API: &str = "https://www.googleapis.com/calendar/v3";

#[derive(Debug, Parser)]
#[command(version, about = "Hierarchical todo server")]
pub struct Args {
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub bind: IpAddr,

    #[arg(short, long, default_value_t = PORT)]
    pub port: u16,

    /// RON file with theme and calendar settings
    #[arg(short, long, default_value = CONFIG_FILE)]
    pub config: PathBuf,

    #[arg(long, env = "SSL_CERT", requires = "tls_key")]
    pub tls_cert: Option<PathBuf>,

    #[arg(long, env = "SSL_KEY", requires = "tls_cert")]
    pub tls_key: Option<PathBuf>,
}

impl Args {
    pub fn tls(&self) -> Option<(&Path, &Path)> {
        Some((self.tls_cert.as_deref()?, self.tls_key.as_deref()?))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub theme: Theme,
    pub calendar_enabled: bool,
    pub calendar: Option<CalendarConfig>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    /// OAuth access token with the calendar scope.
    pub access_token: String,
    pub calendar_id: String,
    pub api_base: String,
    pub time_zone: String,
    /// Upper bound for a single calendar API call.
    pub timeout_secs: u64,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            calendar_id: String::from("primary"),
            api_base: String::from(GOOGLE_CALENDAR_API),
            time_zone: String::from("UTC"),
            timeout_secs: 10,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> eyre::Result<Self> {
        let file = match fs::File::open(path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(err) => eyre::bail!(err),
        };

        Ok(ron::de::from_reader(file)?)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let config = Config::load(Path::new("does/not/exist.ron")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.theme, Theme::Ocean);
    }

    #[test]
    fn calendar_section_fills_in_defaults() {
        let config: Config = ron::from_str(
            r#"(
                theme: forest,
                calendar_enabled: true,
                calendar: Some((access_token: "abc")),
            )"#,
        )
        .unwrap();

        let calendar = config.calendar.unwrap();
        assert_eq!(config.theme, Theme::Forest);
        assert!(config.calendar_enabled);
        assert_eq!(calendar.access_token, "abc");
        assert_eq!(calendar.calendar_id, "primary");
        assert_eq!(calendar.api_base, GOOGLE_CALENDAR_API);
        assert_eq!(calendar.timeout_secs, 10);
    }

    #[test]
    fn tls_needs_both_files() {
        let args = Args::parse_from(["back", "--port", "8000"]);
        assert_eq!(args.port, 8000);
        assert!(args.config.ends_with(CONFIG_FILE));

        let args = Args::parse_from(["back", "--tls-cert", "c.pem", "--tls-key", "k.pem"]);
        assert_eq!(args.tls(), Some((Path::new("c.pem"), Path::new("k.pem"))));
    }
}
