//! 서비스 설정
//!
//! 거래 승인 정책값(TTL, PIN 길이, 잠금 임계값 등)과 서버 설정을 한곳에 모읍니다.
//! 기본값은 `Default`로 제공하고, `.env`/환경 변수로 덮어쓸 수 있습니다.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// 설정 로드 오류
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("환경 변수 {key} 값이 올바르지 않음: {value}")]
    InvalidValue { key: String, value: String },
    #[error("설정 값 범위 오류: {0}")]
    OutOfRange(String),
}

/// 거래 승인 정책 설정
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// 승인 토큰 유효 시간
    pub authorization_ttl: Duration,
    /// PIN 최소 자릿수
    pub pin_min_length: usize,
    /// PIN 최대 자릿수
    pub pin_max_length: usize,
    /// 잠금까지 허용되는 연속 실패 횟수
    pub lockout_threshold: u32,
    /// 잠금 지속 시간
    pub lockout_duration: Duration,
    /// 리스크 조회 / 토큰 저장소 호출 제한 시간
    pub external_call_timeout: Duration,
    /// 브로커 주문 호출 제한 시간
    pub brokerage_timeout: Duration,
    /// 백그라운드 만료 스윕 주기
    pub sweep_interval: Duration,
    /// confirmed 상태로 이 시간 이상 머문 건은 대사(reconcile) 대상
    pub reconcile_after: Duration,
    /// 대사로 해결되지 않은 건을 다시 조회하기까지의 간격
    pub reconcile_recheck_interval: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            authorization_ttl: Duration::from_secs(300),  // 5분
            pin_min_length: 4,
            pin_max_length: 6,
            lockout_threshold: 5,
            lockout_duration: Duration::from_secs(30 * 60), // 30분
            external_call_timeout: Duration::from_secs(5),
            brokerage_timeout: Duration::from_secs(10),
            sweep_interval: Duration::from_secs(30),
            reconcile_after: Duration::from_secs(120),
            reconcile_recheck_interval: Duration::from_secs(15 * 60),
        }
    }
}

impl AuthConfig {
    /// 환경 변수에서 정책값 로드 (없으면 기본값)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            authorization_ttl: Duration::from_secs(env_or(
                "TRADE_AUTH_TTL_SECS",
                defaults.authorization_ttl.as_secs(),
            )?),
            pin_min_length: env_or("TRADE_PIN_MIN_LEN", defaults.pin_min_length)?,
            pin_max_length: env_or("TRADE_PIN_MAX_LEN", defaults.pin_max_length)?,
            lockout_threshold: env_or("TRADE_PIN_LOCKOUT_THRESHOLD", defaults.lockout_threshold)?,
            lockout_duration: Duration::from_secs(
                env_or("TRADE_PIN_LOCKOUT_MINUTES", defaults.lockout_duration.as_secs() / 60)? * 60,
            ),
            external_call_timeout: Duration::from_millis(env_or(
                "EXTERNAL_CALL_TIMEOUT_MS",
                defaults.external_call_timeout.as_millis() as u64,
            )?),
            brokerage_timeout: Duration::from_millis(env_or(
                "BROKERAGE_TIMEOUT_MS",
                defaults.brokerage_timeout.as_millis() as u64,
            )?),
            sweep_interval: Duration::from_secs(env_or(
                "SWEEP_INTERVAL_SECS",
                defaults.sweep_interval.as_secs(),
            )?),
            reconcile_after: Duration::from_secs(env_or(
                "RECONCILE_AFTER_SECS",
                defaults.reconcile_after.as_secs(),
            )?),
            reconcile_recheck_interval: Duration::from_secs(env_or(
                "RECONCILE_RECHECK_SECS",
                defaults.reconcile_recheck_interval.as_secs(),
            )?),
        };
        config.validate()?;
        Ok(config)
    }

    /// 값 범위 검증
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.authorization_ttl.is_zero() {
            return Err(ConfigError::OutOfRange("승인 TTL은 0보다 커야 합니다".into()));
        }
        if self.pin_min_length == 0 || self.pin_min_length > self.pin_max_length {
            return Err(ConfigError::OutOfRange(format!(
                "PIN 길이 범위가 잘못됨: {}-{}",
                self.pin_min_length, self.pin_max_length
            )));
        }
        if self.lockout_threshold == 0 {
            return Err(ConfigError::OutOfRange("잠금 임계값은 1 이상이어야 합니다".into()));
        }
        if self.sweep_interval.is_zero() {
            return Err(ConfigError::OutOfRange("스윕 주기는 0보다 커야 합니다".into()));
        }
        if self.reconcile_recheck_interval.is_zero() {
            return Err(ConfigError::OutOfRange("대사 재조회 간격은 0보다 커야 합니다".into()));
        }
        Ok(())
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.authorization_ttl.as_secs()
    }
}

/// 서버 설정
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub rest_port: u16,
    pub database_url: String,
    /// 없으면 프로세스 내 메모리 토큰 저장소 사용 (로컬 개발용)
    pub redis_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            rest_port: 7000,
            database_url: "sqlite://trade_auth.db?mode=rwc".to_string(),
            redis_url: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            rest_port: env_or("REST_PORT", defaults.rest_port)?,
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            redis_url: env::var("REDIS_URL").ok().filter(|url| !url.trim().is_empty()),
        })
    }
}

/// 전체 애플리케이션 설정
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
}

impl AppConfig {
    /// `.env` 파일을 읽은 뒤 환경 변수에서 설정 로드
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Ok(Self {
            server: ServerConfig::from_env()?,
            auth: AuthConfig::from_env()?,
        })
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value,
        }),
        Err(_) => Ok(default),
    }
}
