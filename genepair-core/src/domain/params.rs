//! Rate and interaction parameters.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// One named entry of a parameter vector.
///
/// The string form is the dataset column header (`p,q,r,s,l,d`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum ParamName {
    /// stayOff rate.
    #[serde(rename = "p")]
    P,
    /// stayOn rate.
    #[serde(rename = "q")]
    Q,
    /// off rate.
    #[serde(rename = "r")]
    R,
    /// on rate.
    #[serde(rename = "s")]
    S,
    /// Coordination multiplier λ.
    #[serde(rename = "l")]
    Lambda,
    /// Competition multiplier δ.
    #[serde(rename = "d")]
    Delta,
}

impl ParamName {
    pub const BASE_RATES: [ParamName; 4] = [ParamName::P, ParamName::Q, ParamName::R, ParamName::S];

    pub fn column(self) -> &'static str {
        match self {
            ParamName::P => "p",
            ParamName::Q => "q",
            ParamName::R => "r",
            ParamName::S => "s",
            ParamName::Lambda => "l",
            ParamName::Delta => "d",
        }
    }

    /// λ and δ are multiplicative factors sampled on [0.01, 100] rather than [0, 1].
    pub fn is_interaction(self) -> bool {
        matches!(self, ParamName::Lambda | ParamName::Delta)
    }
}

impl fmt::Display for ParamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for ParamName {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "p" => Ok(ParamName::P),
            "q" => Ok(ParamName::Q),
            "r" => Ok(ParamName::R),
            "s" => Ok(ParamName::S),
            "l" | "lambda" => Ok(ParamName::Lambda),
            "d" | "delta" => Ok(ParamName::Delta),
            other => Err(ModelError::InvalidParameter(format!(
                "unknown parameter '{other}' (expected one of p, q, r, s, l, d)"
            ))),
        }
    }
}

impl TryFrom<String> for ParamName {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Which algebraic form of the transition matrix to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelVariant {
    /// Six parameters `(p, q, r, s, λ, δ)` with structural zeros. Canonical form.
    #[default]
    Competitive,
    /// Legacy five-parameter form `(p, q, r, s, λ)` with symmetric interaction.
    Symmetric,
}

impl ModelVariant {
    /// Parameters in dataset column order.
    pub fn parameters(self) -> &'static [ParamName] {
        match self {
            ModelVariant::Competitive => &[
                ParamName::P,
                ParamName::Q,
                ParamName::R,
                ParamName::S,
                ParamName::Lambda,
                ParamName::Delta,
            ],
            ModelVariant::Symmetric => &[
                ParamName::P,
                ParamName::Q,
                ParamName::R,
                ParamName::S,
                ParamName::Lambda,
            ],
        }
    }

    pub fn arity(self) -> usize {
        self.parameters().len()
    }

    pub fn has(self, name: ParamName) -> bool {
        self.parameters().contains(&name)
    }
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelVariant::Competitive => f.write_str("competitive"),
            ModelVariant::Symmetric => f.write_str("symmetric"),
        }
    }
}

/// Ordered tuple `(p, q, r, s, λ[, δ])`.
///
/// `delta` is present exactly when the vector belongs to the competitive model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterVector {
    pub p: f64,
    pub q: f64,
    pub r: f64,
    pub s: f64,
    #[serde(rename = "l")]
    pub lambda: f64,
    #[serde(rename = "d", default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<f64>,
}

impl ParameterVector {
    pub fn competitive(p: f64, q: f64, r: f64, s: f64, lambda: f64, delta: f64) -> Self {
        Self {
            p,
            q,
            r,
            s,
            lambda,
            delta: Some(delta),
        }
    }

    pub fn symmetric(p: f64, q: f64, r: f64, s: f64, lambda: f64) -> Self {
        Self {
            p,
            q,
            r,
            s,
            lambda,
            delta: None,
        }
    }

    /// Every base rate set to `base`, every interaction factor set to `interaction`.
    pub fn filled(variant: ModelVariant, base: f64, interaction: f64) -> Self {
        match variant {
            ModelVariant::Competitive => {
                Self::competitive(base, base, base, base, interaction, interaction)
            }
            ModelVariant::Symmetric => Self::symmetric(base, base, base, base, interaction),
        }
    }

    pub fn variant(&self) -> ModelVariant {
        if self.delta.is_some() {
            ModelVariant::Competitive
        } else {
            ModelVariant::Symmetric
        }
    }

    pub fn get(&self, name: ParamName) -> Option<f64> {
        match name {
            ParamName::P => Some(self.p),
            ParamName::Q => Some(self.q),
            ParamName::R => Some(self.r),
            ParamName::S => Some(self.s),
            ParamName::Lambda => Some(self.lambda),
            ParamName::Delta => self.delta,
        }
    }

    /// Copy of `self` with one entry replaced.
    ///
    /// Setting δ on a symmetric vector is rejected: it would silently change the model.
    pub fn with(mut self, name: ParamName, value: f64) -> Result<Self, ModelError> {
        match name {
            ParamName::P => self.p = value,
            ParamName::Q => self.q = value,
            ParamName::R => self.r = value,
            ParamName::S => self.s = value,
            ParamName::Lambda => self.lambda = value,
            ParamName::Delta => match self.delta {
                Some(_) => self.delta = Some(value),
                None => {
                    return Err(ModelError::InvalidParameter(
                        "δ is not a parameter of the symmetric model".into(),
                    ))
                }
            },
        }
        Ok(self)
    }

    /// Values in dataset column order (`p,q,r,s,l[,d]`).
    pub fn values(&self) -> Vec<f64> {
        let mut out = vec![self.p, self.q, self.r, self.s, self.lambda];
        if let Some(d) = self.delta {
            out.push(d);
        }
        out
    }

    /// Base rates `(p, q, r, s)`.
    pub fn base_rates(&self) -> [f64; 4] {
        [self.p, self.q, self.r, self.s]
    }

    /// Checks the vector against the model it is about to be used with.
    pub fn validate(&self, variant: ModelVariant) -> Result<(), ModelError> {
        match (variant, self.delta) {
            (ModelVariant::Competitive, None) => {
                return Err(ModelError::InvalidParameter(
                    "competitive model requires δ".into(),
                ))
            }
            (ModelVariant::Symmetric, Some(_)) => {
                return Err(ModelError::InvalidParameter(
                    "symmetric model takes no δ".into(),
                ))
            }
            _ => {}
        }

        for &name in variant.parameters() {
            let value = self.get(name).unwrap_or(f64::NAN);
            if !value.is_finite() {
                return Err(ModelError::InvalidParameter(format!(
                    "{name} must be finite, got {value}"
                )));
            }
            if name.is_interaction() {
                if value <= 0.0 {
                    return Err(ModelError::InvalidParameter(format!(
                        "{name} must be strictly positive, got {value}"
                    )));
                }
            } else if value < 0.0 {
                return Err(ModelError::InvalidParameter(format!(
                    "{name} must be non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for ParameterVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "p={} q={} r={} s={} l={}",
            self.p, self.q, self.r, self.s, self.lambda
        )?;
        if let Some(d) = self.delta {
            write!(f, " d={d}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn param_names_parse_from_columns() {
        for name in ModelVariant::Competitive.parameters() {
            assert_eq!(name.column().parse::<ParamName>().unwrap(), *name);
        }
        assert_eq!("lambda".parse::<ParamName>().unwrap(), ParamName::Lambda);
        assert!("x".parse::<ParamName>().is_err());
    }

    #[test]
    fn variant_is_inferred_from_delta() {
        assert_eq!(
            ParameterVector::competitive(0.1, 0.2, 0.3, 0.4, 1.0, 2.0).variant(),
            ModelVariant::Competitive
        );
        assert_eq!(
            ParameterVector::symmetric(0.1, 0.2, 0.3, 0.4, 1.0).variant(),
            ModelVariant::Symmetric
        );
    }

    #[test]
    fn values_follow_column_order() {
        let v = ParameterVector::competitive(0.1, 0.2, 0.3, 0.4, 5.0, 6.0);
        assert_eq!(v.values(), vec![0.1, 0.2, 0.3, 0.4, 5.0, 6.0]);
        let v = ParameterVector::symmetric(0.1, 0.2, 0.3, 0.4, 5.0);
        assert_eq!(v.values(), vec![0.1, 0.2, 0.3, 0.4, 5.0]);
    }

    #[test]
    fn with_rejects_delta_on_symmetric() {
        let v = ParameterVector::filled(ModelVariant::Symmetric, 1.0, 1.0);
        assert!(v.with(ParamName::Delta, 2.0).is_err());
        let v = v.with(ParamName::Q, 0.5).unwrap();
        assert_eq!(v.q, 0.5);
    }

    #[test]
    fn validate_rejects_negative_rates_and_nonpositive_interactions() {
        let ok = ParameterVector::competitive(0.0, 0.5, 0.5, 0.5, 1.0, 1.0);
        assert!(ok.validate(ModelVariant::Competitive).is_ok());

        let neg = ParameterVector::competitive(-0.1, 0.5, 0.5, 0.5, 1.0, 1.0);
        assert!(matches!(
            neg.validate(ModelVariant::Competitive),
            Err(ModelError::InvalidParameter(_))
        ));

        let zero_lambda = ParameterVector::symmetric(0.5, 0.5, 0.5, 0.5, 0.0);
        assert!(zero_lambda.validate(ModelVariant::Symmetric).is_err());

        let nan = ParameterVector::symmetric(f64::NAN, 0.5, 0.5, 0.5, 1.0);
        assert!(nan.validate(ModelVariant::Symmetric).is_err());
    }

    #[test]
    fn validate_rejects_variant_mismatch() {
        let sym = ParameterVector::symmetric(0.5, 0.5, 0.5, 0.5, 1.0);
        assert!(sym.validate(ModelVariant::Competitive).is_err());
        let comp = ParameterVector::competitive(0.5, 0.5, 0.5, 0.5, 1.0, 1.0);
        assert!(comp.validate(ModelVariant::Symmetric).is_err());
    }
}
