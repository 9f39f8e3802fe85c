//! Rule catalog: the closed set of strategy names, their parameter
//! declarations, and construction of boxed [`SignalRule`]s.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::params::{ParamError, ParamSpec, Params};
use super::rules::*;
use super::SignalRule;

/// Every strategy the engine knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    BuyAndHold,
    Flat,
    SmaCrossover,
    DemaCrossover,
    TemaCrossover,
    MaRibbon,
    Macd,
    Trix,
    Rsi,
    Stochastic,
    WilliamsR,
    Cci,
    MoneyFlowIndex,
    BollingerBands,
    DonchianChannel,
    KeltnerChannel,
    AtrChannel,
    Aroon,
    AwesomeOscillator,
    ChaikinMoneyFlow,
    Ichimoku,
    OnBalanceVolume,
    ParabolicSar,
    RateOfChange,
    Vortex,
    VwapCrossover,
}

impl RuleKind {
    pub const ALL: [RuleKind; 26] = [
        RuleKind::BuyAndHold,
        RuleKind::Flat,
        RuleKind::SmaCrossover,
        RuleKind::DemaCrossover,
        RuleKind::TemaCrossover,
        RuleKind::MaRibbon,
        RuleKind::Macd,
        RuleKind::Trix,
        RuleKind::Rsi,
        RuleKind::Stochastic,
        RuleKind::WilliamsR,
        RuleKind::Cci,
        RuleKind::MoneyFlowIndex,
        RuleKind::BollingerBands,
        RuleKind::DonchianChannel,
        RuleKind::KeltnerChannel,
        RuleKind::AtrChannel,
        RuleKind::Aroon,
        RuleKind::AwesomeOscillator,
        RuleKind::ChaikinMoneyFlow,
        RuleKind::Ichimoku,
        RuleKind::OnBalanceVolume,
        RuleKind::ParabolicSar,
        RuleKind::RateOfChange,
        RuleKind::Vortex,
        RuleKind::VwapCrossover,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RuleKind::BuyAndHold => "buy_and_hold",
            RuleKind::Flat => "flat",
            RuleKind::SmaCrossover => "sma_crossover",
            RuleKind::DemaCrossover => "dema_crossover",
            RuleKind::TemaCrossover => "tema_crossover",
            RuleKind::MaRibbon => "ma_ribbon",
            RuleKind::Macd => "macd",
            RuleKind::Trix => "trix",
            RuleKind::Rsi => "rsi",
            RuleKind::Stochastic => "stochastic",
            RuleKind::WilliamsR => "williams_r",
            RuleKind::Cci => "cci",
            RuleKind::MoneyFlowIndex => "money_flow_index",
            RuleKind::BollingerBands => "bollinger_bands",
            RuleKind::DonchianChannel => "donchian_channel",
            RuleKind::KeltnerChannel => "keltner_channel",
            RuleKind::AtrChannel => "atr_channel",
            RuleKind::Aroon => "aroon",
            RuleKind::AwesomeOscillator => "awesome_oscillator",
            RuleKind::ChaikinMoneyFlow => "chaikin_money_flow",
            RuleKind::Ichimoku => "ichimoku",
            RuleKind::OnBalanceVolume => "on_balance_volume",
            RuleKind::ParabolicSar => "parabolic_sar",
            RuleKind::RateOfChange => "rate_of_change",
            RuleKind::Vortex => "vortex",
            RuleKind::VwapCrossover => "vwap_crossover",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    /// Parameter declarations, in display order.
    pub fn param_specs(self) -> &'static [ParamSpec] {
        match self {
            RuleKind::BuyAndHold => BuyAndHold::PARAMS,
            RuleKind::Flat => Flat::PARAMS,
            RuleKind::SmaCrossover => SmaCrossover::PARAMS,
            RuleKind::DemaCrossover => DemaCrossover::PARAMS,
            RuleKind::TemaCrossover => TemaCrossover::PARAMS,
            RuleKind::MaRibbon => MaRibbon::PARAMS,
            RuleKind::Macd => Macd::PARAMS,
            RuleKind::Trix => Trix::PARAMS,
            RuleKind::Rsi => Rsi::PARAMS,
            RuleKind::Stochastic => Stochastic::PARAMS,
            RuleKind::WilliamsR => WilliamsR::PARAMS,
            RuleKind::Cci => Cci::PARAMS,
            RuleKind::MoneyFlowIndex => MoneyFlowIndex::PARAMS,
            RuleKind::BollingerBands => BollingerBands::PARAMS,
            RuleKind::DonchianChannel => DonchianChannel::PARAMS,
            RuleKind::KeltnerChannel => KeltnerChannel::PARAMS,
            RuleKind::AtrChannel => AtrChannel::PARAMS,
            RuleKind::Aroon => Aroon::PARAMS,
            RuleKind::AwesomeOscillator => AwesomeOscillator::PARAMS,
            RuleKind::ChaikinMoneyFlow => ChaikinMoneyFlow::PARAMS,
            RuleKind::Ichimoku => Ichimoku::PARAMS,
            RuleKind::OnBalanceVolume => OnBalanceVolume::PARAMS,
            RuleKind::ParabolicSar => ParabolicSar::PARAMS,
            RuleKind::RateOfChange => RateOfChange::PARAMS,
            RuleKind::Vortex => Vortex::PARAMS,
            RuleKind::VwapCrossover => VwapCrossover::PARAMS,
        }
    }

    /// Resolve `overrides` against this rule's parameters.
    pub fn resolve(self, overrides: &BTreeMap<String, f64>) -> Result<Params, ParamError> {
        Params::resolve(self.name(), self.param_specs(), overrides)
    }

    /// Build the rule with `overrides` applied on top of the defaults.
    pub fn build(self, overrides: &BTreeMap<String, f64>) -> Result<Box<dyn SignalRule>, ParamError> {
        let p = self.resolve(overrides)?;
        let rule: Box<dyn SignalRule> = match self {
            RuleKind::BuyAndHold => Box::new(BuyAndHold),
            RuleKind::Flat => Box::new(Flat),
            RuleKind::SmaCrossover => Box::new(SmaCrossover::from_params(&p)),
            RuleKind::DemaCrossover => Box::new(DemaCrossover::from_params(&p)),
            RuleKind::TemaCrossover => Box::new(TemaCrossover::from_params(&p)),
            RuleKind::MaRibbon => Box::new(MaRibbon::from_params(&p)),
            RuleKind::Macd => Box::new(Macd::from_params(&p)),
            RuleKind::Trix => Box::new(Trix::from_params(&p)),
            RuleKind::Rsi => Box::new(Rsi::from_params(&p)),
            RuleKind::Stochastic => Box::new(Stochastic::from_params(&p)),
            RuleKind::WilliamsR => Box::new(WilliamsR::from_params(&p)),
            RuleKind::Cci => Box::new(Cci::from_params(&p)),
            RuleKind::MoneyFlowIndex => Box::new(MoneyFlowIndex::from_params(&p)),
            RuleKind::BollingerBands => Box::new(BollingerBands::from_params(&p)),
            RuleKind::DonchianChannel => Box::new(DonchianChannel::from_params(&p)),
            RuleKind::KeltnerChannel => Box::new(KeltnerChannel::from_params(&p)),
            RuleKind::AtrChannel => Box::new(AtrChannel::from_params(&p)),
            RuleKind::Aroon => Box::new(Aroon::from_params(&p)),
            RuleKind::AwesomeOscillator => Box::new(AwesomeOscillator::from_params(&p)),
            RuleKind::ChaikinMoneyFlow => Box::new(ChaikinMoneyFlow::from_params(&p)),
            RuleKind::Ichimoku => Box::new(Ichimoku::from_params(&p)),
            RuleKind::OnBalanceVolume => Box::new(OnBalanceVolume::from_params(&p)),
            RuleKind::ParabolicSar => Box::new(ParabolicSar::from_params(&p)),
            RuleKind::RateOfChange => Box::new(RateOfChange::from_params(&p)),
            RuleKind::Vortex => Box::new(Vortex::from_params(&p)),
            RuleKind::VwapCrossover => Box::new(VwapCrossover::from_params(&p)),
        };
        Ok(rule)
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RuleKind {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| ParamError::UnknownRule(s.to_string()))
    }
}

/// Build a rule by name.
pub fn build_rule(
    name: &str,
    overrides: &BTreeMap<String, f64>,
) -> Result<Box<dyn SignalRule>, ParamError> {
    name.parse::<RuleKind>()?.build(overrides)
}
