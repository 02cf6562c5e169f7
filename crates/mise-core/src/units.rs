//! Unit expressions, conversion rules, and quantity conversion.
//!
//! Units live in three dimensions (mass, volume, count). Within a
//! dimension conversion is a scalar multiply through a base unit
//! (grams / millilitres / each). Across dimensions an explicit
//! [`ConversionRule`] is required — e.g. `1 each = 800 g` for a loaf
//! purchased whole but used by weight.
//!
//! All arithmetic here is `f64`; rounding to integer minor-currency
//! units happens only in the calculator, never mid-conversion.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Errors raised by unit parsing and conversion.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UnitError {
    #[error("unparseable unit expression: {input:?}")]
    Parse { input: String },
    #[error("unparseable conversion rule: {input:?}")]
    RuleParse { input: String },
    #[error("incompatible units: {from} and {to} (no bridging rule)")]
    Incompatible { from: UnitSymbol, to: UnitSymbol },
}

/// The physical dimension a unit measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Mass,
    Volume,
    Count,
}

/// A recognized unit symbol with a fixed dimension and base-unit scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitSymbol {
    Mg,
    G,
    Kg,
    Oz,
    Lb,
    Ml,
    Cl,
    L,
    Tsp,
    Tbsp,
    Each,
}

impl UnitSymbol {
    pub fn dimension(self) -> Dimension {
        match self {
            Self::Mg | Self::G | Self::Kg | Self::Oz | Self::Lb => Dimension::Mass,
            Self::Ml | Self::Cl | Self::L | Self::Tsp | Self::Tbsp => Dimension::Volume,
            Self::Each => Dimension::Count,
        }
    }

    /// Scale to the dimension's base unit (g, ml, each).
    pub fn base_scale(self) -> f64 {
        match self {
            Self::Mg => 0.001,
            Self::G => 1.0,
            Self::Kg => 1000.0,
            Self::Oz => 28.3495,
            Self::Lb => 453.592,
            Self::Ml => 1.0,
            Self::Cl => 10.0,
            Self::L => 1000.0,
            Self::Tsp => 4.92892,
            Self::Tbsp => 14.7868,
            Self::Each => 1.0,
        }
    }

    fn parse(text: &str) -> Option<Self> {
        Some(match text.to_lowercase().as_str() {
            "mg" => Self::Mg,
            "g" | "gram" | "grams" => Self::G,
            "kg" => Self::Kg,
            "oz" => Self::Oz,
            "lb" | "lbs" => Self::Lb,
            "ml" => Self::Ml,
            "cl" => Self::Cl,
            "l" | "litre" | "liter" => Self::L,
            "tsp" => Self::Tsp,
            "tbsp" => Self::Tbsp,
            "each" | "unit" | "units" | "x" => Self::Each,
            _ => return None,
        })
    }
}

impl fmt::Display for UnitSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Mg => "mg",
            Self::G => "g",
            Self::Kg => "kg",
            Self::Oz => "oz",
            Self::Lb => "lb",
            Self::Ml => "ml",
            Self::Cl => "cl",
            Self::L => "l",
            Self::Tsp => "tsp",
            Self::Tbsp => "tbsp",
            Self::Each => "each",
        };
        write!(f, "{s}")
    }
}

/// An explicit equivalence bridging two quantities, e.g. `1 each = 800 g`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionRule {
    pub from_amount: f64,
    pub from_symbol: UnitSymbol,
    pub to_amount: f64,
    pub to_symbol: UnitSymbol,
}

/// A parsed unit expression.
///
/// Closed variant set — every consumption site matches exhaustively.
/// `Custom` always carries its explicit conversion rule; the other
/// variants carry an implicit 1:1 dimension via their symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Unit {
    /// Plain amount + symbol, e.g. `120g`.
    Measure { amount: f64, symbol: UnitSymbol },
    /// Numerator/denominator + symbol, e.g. `1/2 tsp`.
    Fraction { num: u32, den: u32, symbol: UnitSymbol },
    /// Min-max + symbol, e.g. `100-120g`. The midpoint is used for
    /// arithmetic.
    Range { min: f64, max: f64, symbol: UnitSymbol },
    /// Free-form conversion rule, e.g. `1 each = 800g`.
    Custom { rule: ConversionRule },
}

impl Unit {
    /// Scalar amount used for arithmetic.
    pub fn amount(&self) -> f64 {
        match self {
            Self::Measure { amount, .. } => *amount,
            Self::Fraction { num, den, .. } => f64::from(*num) / f64::from(*den),
            Self::Range { min, max, .. } => (min + max) / 2.0,
            Self::Custom { rule } => rule.from_amount,
        }
    }

    pub fn symbol(&self) -> UnitSymbol {
        match self {
            Self::Measure { symbol, .. }
            | Self::Fraction { symbol, .. }
            | Self::Range { symbol, .. } => *symbol,
            Self::Custom { rule } => rule.from_symbol,
        }
    }

    pub fn dimension(&self) -> Dimension {
        self.symbol().dimension()
    }

    /// The bridging rule a `Custom` unit carries, if any.
    pub fn rule(&self) -> Option<&ConversionRule> {
        match self {
            Self::Custom { rule } => Some(rule),
            _ => None,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Measure { amount, symbol } => write!(f, "{amount}{symbol}"),
            Self::Fraction { num, den, symbol } => write!(f, "{num}/{den} {symbol}"),
            Self::Range { min, max, symbol } => write!(f, "{min}-{max}{symbol}"),
            Self::Custom { rule } => write!(
                f,
                "{} {} = {} {}",
                rule.from_amount, rule.from_symbol, rule.to_amount, rule.to_symbol
            ),
        }
    }
}

/// Longest numeric prefix plus the trimmed remainder. `None` when the
/// input has no numeric prefix or nothing after it.
fn lex_amount(text: &str) -> Option<(f64, &str)> {
    let end = text.find(|c: char| !c.is_ascii_digit() && c != '.')?;
    if end == 0 {
        return None;
    }
    let amount: f64 = text[..end].parse().ok()?;
    Some((amount, text[end..].trim()))
}

fn parse_error(input: &str) -> UnitError {
    UnitError::Parse {
        input: input.to_string(),
    }
}

/// Lex a unit expression into one of the four [`Unit`] variants.
///
/// No partial accepts: the whole input must lex, including the symbol.
pub fn parse_unit(text: &str) -> Result<Unit, UnitError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(parse_error(text));
    }

    // A rule string ("1 each = 800g") is a Custom unit.
    if trimmed.contains('=') {
        let rule = parse_conversion_rule(trimmed).map_err(|_| parse_error(text))?;
        return Ok(Unit::Custom { rule });
    }

    // Fraction: "1/2 tsp"
    if let Some((num_s, rest)) = trimmed.split_once('/') {
        let num: u32 = num_s.trim().parse().map_err(|_| parse_error(text))?;
        let (den_f, sym_s) = lex_amount(rest.trim_start()).ok_or_else(|| parse_error(text))?;
        if den_f.fract() != 0.0 || den_f <= 0.0 {
            return Err(parse_error(text));
        }
        let symbol = UnitSymbol::parse(sym_s).ok_or_else(|| parse_error(text))?;
        return Ok(Unit::Fraction {
            num,
            den: den_f as u32,
            symbol,
        });
    }

    // Range: "100-120g"
    if let Some((min_s, rest)) = trimmed.split_once('-') {
        let min: f64 = min_s.trim().parse().map_err(|_| parse_error(text))?;
        let (max, sym_s) = lex_amount(rest.trim_start()).ok_or_else(|| parse_error(text))?;
        if min > max {
            return Err(parse_error(text));
        }
        let symbol = UnitSymbol::parse(sym_s).ok_or_else(|| parse_error(text))?;
        return Ok(Unit::Range { min, max, symbol });
    }

    // Plain measure: "120g" / "120 g"
    let (amount, sym_s) = lex_amount(trimmed).ok_or_else(|| parse_error(text))?;
    let symbol = UnitSymbol::parse(sym_s).ok_or_else(|| parse_error(text))?;
    Ok(Unit::Measure { amount, symbol })
}

/// Lex a conversion rule of the form `<amount> <symbol> = <amount> <symbol>`.
pub fn parse_conversion_rule(text: &str) -> Result<ConversionRule, UnitError> {
    let rule_error = || UnitError::RuleParse {
        input: text.to_string(),
    };

    let (lhs, rhs) = text.split_once('=').ok_or_else(rule_error)?;
    let (from_amount, from_s) = lex_amount(lhs.trim()).ok_or_else(rule_error)?;
    let (to_amount, to_s) = lex_amount(rhs.trim()).ok_or_else(rule_error)?;
    let from_symbol = UnitSymbol::parse(from_s).ok_or_else(rule_error)?;
    let to_symbol = UnitSymbol::parse(to_s).ok_or_else(rule_error)?;

    if from_amount <= 0.0 || to_amount <= 0.0 {
        return Err(rule_error());
    }

    Ok(ConversionRule {
        from_amount,
        from_symbol,
        to_amount,
        to_symbol,
    })
}

/// Convert `amount` from one symbol to another.
///
/// Same dimension: scalar multiply through the base unit. Different
/// dimensions: requires an applicable bridging rule (in either
/// orientation), else [`UnitError::Incompatible`].
pub fn convert(
    amount: f64,
    from: UnitSymbol,
    to: UnitSymbol,
    rule: Option<&ConversionRule>,
) -> Result<f64, UnitError> {
    if from.dimension() == to.dimension() {
        return Ok(amount * from.base_scale() / to.base_scale());
    }

    let rule = rule.ok_or(UnitError::Incompatible { from, to })?;
    if rule.from_symbol.dimension() == from.dimension()
        && rule.to_symbol.dimension() == to.dimension()
    {
        // amount → rule terms → across the bridge → target terms.
        let in_rule_from = amount * from.base_scale() / rule.from_symbol.base_scale();
        let bridged = in_rule_from / rule.from_amount * rule.to_amount;
        Ok(bridged * rule.to_symbol.base_scale() / to.base_scale())
    } else if rule.to_symbol.dimension() == from.dimension()
        && rule.from_symbol.dimension() == to.dimension()
    {
        let in_rule_to = amount * from.base_scale() / rule.to_symbol.base_scale();
        let bridged = in_rule_to / rule.to_amount * rule.from_amount;
        Ok(bridged * rule.from_symbol.base_scale() / to.base_scale())
    } else {
        Err(UnitError::Incompatible { from, to })
    }
}

/// Convert `amount` (expressed in `from`'s symbol) into `to`'s symbol.
///
/// An explicit `rule` wins; otherwise a rule embedded in a `Custom`
/// endpoint is used.
pub fn convert_units(
    amount: f64,
    from: &Unit,
    to: &Unit,
    rule: Option<&ConversionRule>,
) -> Result<f64, UnitError> {
    let rule = rule.or_else(|| from.rule()).or_else(|| to.rule());
    convert(amount, from.symbol(), to.symbol(), rule)
}
