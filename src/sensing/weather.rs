//! 天气服务客户端
//!
//! 按经纬度查询当前气温和天气代码 (Open-Meteo 接口)

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::WeatherConfig;
use crate::error::{KioskError, Result};
use super::types::WeatherReading;

/// 天气查询
#[async_trait]
pub trait WeatherService: Send + Sync {
    async fn lookup(&self, latitude: f64, longitude: f64) -> Result<WeatherReading>;
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: CurrentWeather,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    temperature_2m: f32,
    weather_code: i32,
}

/// Open-Meteo 客户端
pub struct OpenMeteoClient {
    client: Client,
    base_url: String,
}

impl OpenMeteoClient {
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn forecast_url(&self) -> String {
        format!("{}/v1/forecast", self.base_url)
    }
}

#[async_trait]
impl WeatherService for OpenMeteoClient {
    async fn lookup(&self, latitude: f64, longitude: f64) -> Result<WeatherReading> {
        let url = self.forecast_url();
        debug!("Requesting weather for ({:.4}, {:.4})", latitude, longitude);

        let response = self.client
            .get(&url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("current", "temperature_2m,weather_code".to_string()),
            ])
            .send()
            .await
            .map_err(|e| KioskError::WeatherUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await.unwrap_or_default();
            return Err(KioskError::WeatherUnavailable(format!(
                "weather request failed ({}): {}",
                status, error
            )));
        }

        let result: ForecastResponse = response
            .json()
            .await
            .map_err(|e| KioskError::WeatherUnavailable(e.to_string()))?;

        info!(
            "Weather resolved: code={} temperature={:.1}°C",
            result.current.weather_code, result.current.temperature_2m
        );

        Ok(WeatherReading {
            condition_code: result.current.weather_code,
            temperature_c: result.current.temperature_2m,
        })
    }
}

/// 固定天气 (演示和测试)
#[derive(Debug, Clone, Copy)]
pub struct FixedWeather(pub WeatherReading);

#[async_trait]
impl WeatherService for FixedWeather {
    async fn lookup(&self, _latitude: f64, _longitude: f64) -> Result<WeatherReading> {
        Ok(self.0)
    }
}

/// 总是失败的天气服务 (模拟定位权限被拒)
#[derive(Debug, Clone)]
pub struct UnavailableWeather(pub String);

#[async_trait]
impl WeatherService for UnavailableWeather {
    async fn lookup(&self, _latitude: f64, _longitude: f64) -> Result<WeatherReading> {
        Err(KioskError::WeatherUnavailable(self.0.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensing::types::WeatherCondition;

    #[test]
    fn test_client_creation() {
        let config = WeatherConfig {
            base_url: "http://localhost:8080/".to_string(),
            ..Default::default()
        };
        let client = OpenMeteoClient::new(&config).unwrap();
        assert_eq!(client.forecast_url(), "http://localhost:8080/v1/forecast");
    }

    #[test]
    fn test_parse_forecast() {
        let body = r#"{"latitude":33.5,"current":{"time":"2024-06-01T09:00","temperature_2m":5.5,"weather_code":63}}"#;
        let parsed: ForecastResponse = serde_json::from_str(body).unwrap();
        let reading = WeatherReading {
            condition_code: parsed.current.weather_code,
            temperature_c: parsed.current.temperature_2m,
        };
        assert_eq!(reading.condition(), WeatherCondition::Rain);
        assert!((reading.temperature_c - 5.5).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_unavailable_weather() {
        let service = UnavailableWeather("User denied Geolocation".to_string());
        let err = service.lookup(0.0, 0.0).await.unwrap_err();
        assert_eq!(err.to_string(), "User denied Geolocation");
    }
}
