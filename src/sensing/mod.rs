//! 传感与外部服务

pub mod oracle;
pub mod scripted;
pub mod types;
pub mod weather;

pub use oracle::{AttributeOracle, GestureOracle};
pub use types::{
    FaceBox, FaceEstimate, GestureScore, HandObservation, Landmark, WeatherCondition,
    WeatherReading,
};
pub use weather::{FixedWeather, OpenMeteoClient, UnavailableWeather, WeatherService};
