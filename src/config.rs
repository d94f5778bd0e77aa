use crate::entities::Tier;
use crate::gacha::{PityRules, TierRates};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub gacha: GachaConfig,
    #[serde(default)]
    pub stardust: StardustConfig,
    #[serde(default)]
    pub idempotency: IdempotencyConfig,
    #[serde(default)]
    pub tasks: TasksConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
        }
    }
}

/// 管理端与发放代理使用的 API Key (X-Api-Key)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(default)]
    pub admin_api_key: String,
    #[serde(default)]
    pub delivery_api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GachaConfig {
    pub tier_rates: TierRates,
    /// 道具相对精灵的权重系数
    pub item_multiplier: f64,
    pub pity: PityRules,
    pub max_fate_points: u32,
    pub featured_win_rate: f64,
    pub shiny_rate: f64,
    pub multi_pull_size: u32,
    pub standard_single_cost: i64,
    pub standard_multi_cost: i64,
    pub default_rate_up_multiplier: f64,
    /// 序列化冲突 / 死锁时的最大重试次数
    pub max_transaction_retries: u32,
}

impl Default for GachaConfig {
    fn default() -> Self {
        Self {
            tier_rates: TierRates::default(),
            item_multiplier: 0.35,
            pity: PityRules::default(),
            max_fate_points: 2,
            featured_win_rate: 0.5,
            shiny_rate: 1.0 / 512.0,
            multi_pull_size: 10,
            standard_single_cost: 160,
            standard_multi_cost: 1600,
            default_rate_up_multiplier: 2.0,
            max_transaction_retries: 3,
        }
    }
}

/// 重复获得时按层级发放的星尘数量
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierAmounts {
    pub common: i64,
    pub uncommon: i64,
    pub rare: i64,
    pub epic: i64,
    pub legendary: i64,
    pub mythic: i64,
}

impl Default for TierAmounts {
    fn default() -> Self {
        Self {
            common: 5,
            uncommon: 10,
            rare: 25,
            epic: 50,
            legendary: 100,
            mythic: 200,
        }
    }
}

impl TierAmounts {
    pub fn amount(&self, tier: Tier) -> i64 {
        match tier {
            Tier::Common => self.common,
            Tier::Uncommon => self.uncommon,
            Tier::Rare => self.rare,
            Tier::Epic => self.epic,
            Tier::Legendary => self.legendary,
            Tier::Mythic => self.mythic,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StardustConfig {
    pub tier_amounts: TierAmounts,
    pub variant_multiplier: i64,
    /// 重复获得时写入待发放队列的游戏内代币数量 (0 = 仅记录)
    pub duplicate_token_amount: i64,
}

impl Default for StardustConfig {
    fn default() -> Self {
        Self {
            tier_amounts: TierAmounts::default(),
            variant_multiplier: 3,
            duplicate_token_amount: 0,
        }
    }
}

impl StardustConfig {
    pub fn duplicate_value(&self, tier: Tier, variant: bool) -> i64 {
        let base = self.tier_amounts.amount(tier);
        if variant {
            base * self.variant_multiplier
        } else {
            base
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdempotencyConfig {
    pub retention_hours: i64,
    pub in_flight_lease_seconds: i64,
}

impl Default for IdempotencyConfig {
    fn default() -> Self {
        Self {
            retention_hours: 24,
            in_flight_lease_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TasksConfig {
    pub enabled: bool,
    pub banner_sweep_interval_secs: u64,
    pub idempotency_purge_interval_secs: u64,
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            banner_sweep_interval_secs: 60,
            idempotency_purge_interval_secs: 3600,
        }
    }
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // 尝试读取配置文件，如果不存在则完全依赖环境变量
        let mut config: Config = match std::fs::read_to_string(&config_path) {
            Ok(config_str) => Self::parse(&config_str)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                // 数据库 URL 在无配置文件时必须提供
                let database_url = env::var("DATABASE_URL")
                    .map_err(|_| "缺少 DATABASE_URL 环境变量，且未找到配置文件 config.toml")?;
                Config {
                    database: DatabaseConfig {
                        url: database_url,
                        ..DatabaseConfig::default()
                    },
                    ..Config::default()
                }
            }
            Err(e) => {
                return Err(format!("无法读取配置文件 {config_path}: {e}").into());
            }
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn parse(config_str: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: Config =
            toml::from_str(config_str).map_err(|e| format!("解析配置文件失败: {e}"))?;
        Ok(config)
    }

    /// 环境变量覆盖（即便文件存在时也覆盖）
    fn apply_env_overrides(&mut self) {
        fn parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
            env::var(name).ok().and_then(|v| v.parse::<T>().ok())
        }

        if let Ok(v) = env::var("SERVER_HOST") {
            self.server.host = v;
        }
        if let Some(p) = parsed("SERVER_PORT") {
            self.server.port = p;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Some(mc) = parsed("DB_MAX_CONNECTIONS") {
            self.database.max_connections = mc;
        }
        if let Ok(v) = env::var("ADMIN_API_KEY") {
            self.security.admin_api_key = v;
        }
        if let Ok(v) = env::var("DELIVERY_API_KEY") {
            self.security.delivery_api_key = v;
        }
        if let Some(r) = parsed("GACHA_SHINY_RATE") {
            self.gacha.shiny_rate = r;
        }
        if let Some(n) = parsed("GACHA_MAX_TRANSACTION_RETRIES") {
            self.gacha.max_transaction_retries = n;
        }
        if let Some(n) = parsed("STARDUST_DUPLICATE_TOKEN_AMOUNT") {
            self.stardust.duplicate_token_amount = n;
        }
        if let Some(h) = parsed("IDEMPOTENCY_RETENTION_HOURS") {
            self.idempotency.retention_hours = h;
        }
        if let Some(b) = parsed("TASKS_ENABLED") {
            self.tasks.enabled = b;
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let g = &self.gacha;
        g.tier_rates.validate()?;
        g.pity.validate()?;
        if !g.item_multiplier.is_finite() || g.item_multiplier < 0.0 {
            return Err("gacha.item_multiplier must be a non-negative number".into());
        }
        for (name, p) in [
            ("gacha.featured_win_rate", g.featured_win_rate),
            ("gacha.shiny_rate", g.shiny_rate),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(format!("{name} must be within [0, 1]"));
            }
        }
        if g.multi_pull_size < 2 {
            return Err("gacha.multi_pull_size must be at least 2".into());
        }
        if g.standard_single_cost <= 0 || g.standard_multi_cost <= 0 {
            return Err("standard banner costs must be positive".into());
        }
        if !g.default_rate_up_multiplier.is_finite() || g.default_rate_up_multiplier < 1.0 {
            return Err("gacha.default_rate_up_multiplier must be >= 1".into());
        }

        let s = &self.stardust;
        if Tier::ALL.iter().any(|t| s.tier_amounts.amount(*t) < 0) {
            return Err("stardust.tier_amounts must not be negative".into());
        }
        if s.variant_multiplier < 1 {
            return Err("stardust.variant_multiplier must be >= 1".into());
        }
        if s.duplicate_token_amount < 0 {
            return Err("stardust.duplicate_token_amount must not be negative".into());
        }

        if self.idempotency.retention_hours <= 0 || self.idempotency.in_flight_lease_seconds <= 0
        {
            return Err("idempotency windows must be positive".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[server]
host = "127.0.0.1"
port = 9000

[database]
url = "postgres://localhost/gacha"
max_connections = 5
"#;

    #[test]
    fn test_minimal_file_uses_defaults() {
        let config = Config::parse(MINIMAL).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.gacha.pity.hard_pity, 90);
        assert_eq!(config.gacha.multi_pull_size, 10);
        assert_eq!(config.stardust.tier_amounts.legendary, 100);
        assert_eq!(config.idempotency.retention_hours, 24);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_sections_merge_with_defaults() {
        let toml = format!(
            "{MINIMAL}\n[gacha]\nshiny_rate = 0.5\n\n[gacha.pity]\nhard_pity = 80\n\n[stardust]\nvariant_multiplier = 4\n"
        );
        let config = Config::parse(&toml).unwrap();
        assert_eq!(config.gacha.shiny_rate, 0.5);
        assert_eq!(config.gacha.pity.hard_pity, 80);
        assert_eq!(config.gacha.pity.soft_pity_start, 74);
        assert_eq!(config.stardust.duplicate_value(Tier::Epic, true), 200);
        assert_eq!(config.stardust.duplicate_value(Tier::Epic, false), 50);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::parse(MINIMAL).unwrap();
        config.gacha.featured_win_rate = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::parse(MINIMAL).unwrap();
        config.gacha.pity.soft_pity_start = 100;
        assert!(config.validate().is_err());

        let mut config = Config::parse(MINIMAL).unwrap();
        config.stardust.variant_multiplier = 0;
        assert!(config.validate().is_err());
    }
}
