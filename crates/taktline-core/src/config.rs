use crate::error::{Result, TaktError};
use crate::paths;
use crate::types::CellName;
use chrono::{FixedOffset, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// CheckDefinition
// ---------------------------------------------------------------------------

/// One external check run by the build cell: a shell command with a hard
/// timeout. Timeouts count as failure, never as pulse errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckDefinition {
    pub command: String,
    #[serde(default = "default_check_timeout")]
    pub timeout_seconds: u64,
}

fn default_check_timeout() -> u64 {
    60
}

// ---------------------------------------------------------------------------
// BuildConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Project the build cell watches. Absent → gate stays `unknown`.
    #[serde(default)]
    pub project_dir: Option<PathBuf>,
    #[serde(default = "default_test_check")]
    pub test: CheckDefinition,
    #[serde(default = "default_types_check")]
    pub types: CheckDefinition,
    #[serde(default = "default_security_check")]
    pub security: CheckDefinition,
}

fn default_test_check() -> CheckDefinition {
    CheckDefinition {
        command: "make test".to_string(),
        timeout_seconds: 120,
    }
}

fn default_types_check() -> CheckDefinition {
    CheckDefinition {
        command: "make typecheck".to_string(),
        timeout_seconds: 60,
    }
}

fn default_security_check() -> CheckDefinition {
    CheckDefinition {
        command: "make audit".to_string(),
        timeout_seconds: 60,
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            project_dir: None,
            test: default_test_check(),
            types: default_types_check(),
            security: default_security_check(),
        }
    }
}

// ---------------------------------------------------------------------------
// ShipConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductEntry {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipConfig {
    #[serde(default = "default_catalog")]
    pub catalog: Vec<ProductEntry>,
    #[serde(default = "default_week_1_target")]
    pub week_1_target: f64,
    #[serde(default = "default_month_1_target")]
    pub month_1_target: f64,
    #[serde(default = "default_month_6_target")]
    pub month_6_target: f64,
}

fn default_catalog() -> Vec<ProductEntry> {
    [
        ("starter-toolkit", "Starter Toolkit"),
        ("field-guide", "Field Guide"),
        ("prompt-packs", "Prompt Packs"),
        ("digest-brief", "Digest Brief"),
        ("skill-bundle", "Skill Bundle"),
        ("research-sub", "Research Subscription"),
    ]
    .into_iter()
    .map(|(id, name)| ProductEntry {
        id: id.to_string(),
        name: name.to_string(),
    })
    .collect()
}

fn default_week_1_target() -> f64 {
    100.0
}

fn default_month_1_target() -> f64 {
    1000.0
}

fn default_month_6_target() -> f64 {
    10000.0
}

impl Default for ShipConfig {
    fn default() -> Self {
        Self {
            catalog: default_catalog(),
            week_1_target: default_week_1_target(),
            month_1_target: default_month_1_target(),
            month_6_target: default_month_6_target(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    /// Local clock used for mode selection and brief headers.
    #[serde(default = "default_utc_offset")]
    pub utc_offset_hours: i32,
    #[serde(default = "default_wake_time")]
    pub wake_time: String,
    #[serde(default = "default_night_time")]
    pub night_time: String,
    /// Per-cell response-SLA targets (seconds), echoed in every cascade.
    #[serde(default = "default_response_sla")]
    pub response_sla: BTreeMap<String, u64>,
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default)]
    pub ship: ShipConfig,
}

fn default_version() -> u32 {
    1
}

fn default_utc_offset() -> i32 {
    8
}

fn default_wake_time() -> String {
    "06:00".to_string()
}

fn default_night_time() -> String {
    "21:00".to_string()
}

fn default_response_sla() -> BTreeMap<String, u64> {
    [
        ("research".to_string(), 30),
        ("build".to_string(), 20),
        ("ship".to_string(), 15),
        ("monitor".to_string(), 10),
    ]
    .into_iter()
    .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: 1,
            utc_offset_hours: default_utc_offset(),
            wake_time: default_wake_time(),
            night_time: default_night_time(),
            response_sla: default_response_sla(),
            build: BuildConfig::default(),
            ship: ShipConfig::default(),
        }
    }
}

impl Config {
    /// Load `config.yaml` from the coordinator root. An absent file is the
    /// all-defaults configuration; a malformed file is an error.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Config::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        cfg.local_offset()?;
        cfg.wake_time()?;
        cfg.night_time()?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    pub fn local_offset(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_hours * 3600).ok_or_else(|| {
            TaktError::Config(format!(
                "utc_offset_hours {} out of range",
                self.utc_offset_hours
            ))
        })
    }

    pub fn wake_time(&self) -> Result<NaiveTime> {
        parse_local_time("wake_time", &self.wake_time)
    }

    pub fn night_time(&self) -> Result<NaiveTime> {
        parse_local_time("night_time", &self.night_time)
    }

    pub fn sla_for(&self, cell: CellName) -> u64 {
        self.response_sla.get(cell.as_str()).copied().unwrap_or(30)
    }
}

fn parse_local_time(field: &str, value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|e| TaktError::Config(format!("{field} '{value}' is not HH:MM: {e}")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
