//! Concrete signal rules, grouped by indicator family.

pub mod channel;
pub mod moving_average;
pub mod oscillator;
pub mod trend;

pub use channel::{
    AtrChannel, Aroon, BollingerBands, DonchianChannel, Ichimoku, KeltnerChannel, Vortex,
};
pub use moving_average::{DemaCrossover, Macd, MaRibbon, SmaCrossover, TemaCrossover, Trix};
pub use oscillator::{
    AwesomeOscillator, Cci, ChaikinMoneyFlow, MoneyFlowIndex, OnBalanceVolume, RateOfChange, Rsi,
    Stochastic, VwapCrossover, WilliamsR,
};
pub use trend::{BuyAndHold, Flat, ParabolicSar};
