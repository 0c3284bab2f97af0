//! BJT (Bipolar Junction Transistor) model.
//!
//! Uses the Ebers-Moll transport model for NPN and PNP transistors: two
//! exponential junctions (base-emitter and base-collector) whose currents
//! are coupled through the forward and reverse current gains.
//!
//! Terminals are ordered base, collector, emitter. With
//! `Vbe = Vb - Ve` and `Vbc = Vb - Vc`:
//!
//! ```text
//! Ib = Is * ((exp(Vbe/Vt) - 1) / Bf + (exp(Vbc/Vt) - 1) / Br)
//! Ic = Is * ((exp(Vbe/Vt) - exp(Vbc/Vt)) - (exp(Vbc/Vt) - 1) / Br)
//! ```
//!
//! The PNP model is the NPN model evaluated on negated terminal voltages,
//! with the resulting currents negated.

use std::fmt;

use super::Evaluation;
use crate::error::{NodalError, Result};

/// Default saturation current (A).
pub const DEFAULT_SATURATION_CURRENT: f64 = 1e-12;

/// Default thermal voltage (V).
pub const DEFAULT_THERMAL_VOLTAGE: f64 = 26e-3;

/// Exponent above which the junction exponential is continued linearly.
pub const EXP_LIMIT: f64 = 40.0;

/// Exponential continued by its tangent line above [`EXP_LIMIT`].
///
/// Returns `(value, derivative)`. Both stay finite for any finite argument.
#[inline]
pub fn limited_exp(x: f64) -> (f64, f64) {
    if x > EXP_LIMIT {
        let e = EXP_LIMIT.exp();
        (e * (1.0 + (x - EXP_LIMIT)), e)
    } else {
        let e = x.exp();
        (e, e)
    }
}

/// BJT type (NPN or PNP).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BjtType {
    Npn,
    Pnp,
}

impl BjtType {
    fn sign(self) -> f64 {
        match self {
            BjtType::Npn => 1.0,
            BjtType::Pnp => -1.0,
        }
    }

    /// Display name of the device.
    pub fn name(self) -> &'static str {
        match self {
            BjtType::Npn => "Transistor NPN",
            BjtType::Pnp => "Transistor PNP",
        }
    }
}

/// Parameters for a BJT model.
#[derive(Debug, Clone, PartialEq)]
pub struct BjtParams {
    /// Saturation current (Is)
    pub is: f64,
    /// Thermal voltage (Vt)
    pub vt: f64,
    /// Forward current gain (β_F)
    pub beta_f: f64,
    /// Reverse current gain (β_R)
    pub beta_r: f64,
    /// Emission coefficient, scales the thermal voltage
    pub n: f64,
}

impl Default for BjtParams {
    fn default() -> Self {
        Self {
            is: DEFAULT_SATURATION_CURRENT,
            vt: DEFAULT_THERMAL_VOLTAGE,
            beta_f: 100.0,
            beta_r: 1.0,
            n: 1.0,
        }
    }
}

impl BjtParams {
    /// Thermal voltage times emission coefficient.
    pub fn n_vt(&self) -> f64 {
        self.n * self.vt
    }

    fn validate(&self, component: &str) -> Result<()> {
        let fields = [
            ("is", self.is),
            ("vt", self.vt),
            ("bf", self.beta_f),
            ("br", self.beta_r),
            ("n", self.n),
        ];
        for (param, value) in fields {
            if !(value.is_finite() && value > 0.0) {
                return Err(NodalError::invalid_parameter(
                    component,
                    param,
                    format!("must be finite and positive, got {}", value),
                ));
            }
        }
        Ok(())
    }
}

/// A BJT component.
#[derive(Debug, Clone, PartialEq)]
pub struct Bjt {
    pub bjt_type: BjtType,
    pub params: BjtParams,
}

impl Bjt {
    /// Terminal names, in pin order.
    pub const TERMINALS: [&'static str; 3] = ["base", "collector", "emitter"];

    /// Create a new BJT, rejecting non-positive parameters.
    pub fn new(bjt_type: BjtType, params: BjtParams) -> Result<Self> {
        params.validate(bjt_type.name())?;
        Ok(Self { bjt_type, params })
    }

    /// NPN transistor with default parameters.
    pub fn npn() -> Self {
        Self {
            bjt_type: BjtType::Npn,
            params: BjtParams::default(),
        }
    }

    /// PNP transistor with default parameters.
    pub fn pnp() -> Self {
        Self {
            bjt_type: BjtType::Pnp,
            params: BjtParams::default(),
        }
    }

    /// Junction exponentials `(exp(Vbe/Vt), exp(Vbc/Vt))` with derivatives,
    /// in the NPN frame.
    fn junctions(&self, v_be: f64, v_bc: f64) -> ((f64, f64), (f64, f64)) {
        let n_vt = self.params.n_vt();
        (limited_exp(v_be / n_vt), limited_exp(v_bc / n_vt))
    }

    /// Calculate the base current (Ib) flowing into the device.
    pub fn i_b(&self, v_be: f64, v_bc: f64) -> f64 {
        let sign = self.bjt_type.sign();
        let ((ebe, _), (ebc, _)) = self.junctions(sign * v_be, sign * v_bc);
        let p = &self.params;
        sign * p.is * ((ebe - 1.0) / p.beta_f + (ebc - 1.0) / p.beta_r)
    }

    /// Calculate the collector current (Ic) flowing into the device.
    pub fn i_c(&self, v_be: f64, v_bc: f64) -> f64 {
        let sign = self.bjt_type.sign();
        let ((ebe, _), (ebc, _)) = self.junctions(sign * v_be, sign * v_bc);
        let p = &self.params;
        sign * p.is * ((ebe - ebc) - (ebc - 1.0) / p.beta_r)
    }

    /// Calculate the emitter current (Ie) flowing out of the device.
    pub fn i_e(&self, v_be: f64, v_bc: f64) -> f64 {
        self.i_b(v_be, v_bc) + self.i_c(v_be, v_bc)
    }

    /// Current into the node at each terminal, and its gradient.
    pub fn evaluate(&self, voltages: &[f64]) -> Evaluation {
        let sign = self.bjt_type.sign();
        let v_b = sign * voltages[0];
        let v_c = sign * voltages[1];
        let v_e = sign * voltages[2];

        let p = &self.params;
        let n_vt = p.n_vt();
        let ((ebe, dbe), (ebc, dbc)) = self.junctions(v_b - v_e, v_b - v_c);

        let ib = p.is * ((ebe - 1.0) / p.beta_f + (ebc - 1.0) / p.beta_r);
        let ic = p.is * ((ebe - ebc) - (ebc - 1.0) / p.beta_r);

        // Partial derivatives with respect to Vbe and Vbc
        let ib_be = p.is * dbe / n_vt / p.beta_f;
        let ib_bc = p.is * dbc / n_vt / p.beta_r;
        let ic_be = p.is * dbe / n_vt;
        let ic_bc = -p.is * dbc * (1.0 + 1.0 / p.beta_r) / n_vt;

        let mut eval = Evaluation::new(3);
        eval.currents[0] = sign * -ib;
        eval.currents[1] = sign * -ic;
        eval.currents[2] = sign * (ib + ic);

        // d/dVb = d/dVbe + d/dVbc, d/dVc = -d/dVbc, d/dVe = -d/dVbe.
        // The polarity sign appears twice and cancels.
        eval.gradient[0] = [-(ib_be + ib_bc), ib_bc, ib_be];
        eval.gradient[1] = [-(ic_be + ic_bc), ic_bc, ic_be];
        eval.gradient[2] = [
            ib_be + ib_bc + ic_be + ic_bc,
            -(ib_bc + ic_bc),
            -(ib_be + ic_be),
        ];
        eval
    }
}

impl fmt::Display for Bjt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = &self.params;
        write!(
            f,
            "{} (Is={:e}, Vt={:e}, Br={}, Bf={})",
            self.bjt_type.name(),
            p.is,
            p.n_vt(),
            p.beta_r,
            p.beta_f
        )
    }
}
