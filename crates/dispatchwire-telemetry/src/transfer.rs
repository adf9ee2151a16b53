use serde::Serialize;

/// Affine calibration from raw ADU codes to physical units.
///
/// Bipolar quantities use sign-magnitude on 16 bits: bit 15 set means
/// negative, the low 15 bits hold the magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TransferFunction {
    pub slope: f64,
    pub intercept: f64,
    pub bipolar: bool,
    pub unit: &'static str,
}

const SIGN_BIT: u16 = 0x8000;
const MAGNITUDE_MASK: u16 = 0x7FFF;

/// TES bias DAC offset: ±9 V over 15 bits of magnitude.
pub const VOFFSET: TransferFunction = TransferFunction::bipolar(9.0 / 32768.0, "V");

/// TES bias DAC amplitude.
pub const TESDAC_AMPLITUDE: TransferFunction = TransferFunction::new(9.0 / 32768.0, 0.0, "V");

/// TES bias DAC frequency.
pub const TESDAC_FREQUENCY: TransferFunction = TransferFunction::new(0.01, 0.0, "Hz");

impl TransferFunction {
    /// Unipolar mapping `slope * raw + intercept`.
    pub const fn new(slope: f64, intercept: f64, unit: &'static str) -> Self {
        Self {
            slope,
            intercept,
            bipolar: false,
            unit,
        }
    }

    /// Sign-magnitude mapping with zero intercept.
    pub const fn bipolar(slope: f64, unit: &'static str) -> Self {
        Self {
            slope,
            intercept: 0.0,
            bipolar: true,
            unit,
        }
    }

    /// Raw code to physical value.
    ///
    /// Bipolar functions only look at the low 16 bits of `raw`.
    pub fn to_physical(&self, raw: u32) -> f64 {
        if self.bipolar {
            let word = raw as u16;
            let magnitude = f64::from(word & MAGNITUDE_MASK);
            let signed = if word & SIGN_BIT != 0 {
                -magnitude
            } else {
                magnitude
            };
            self.slope * signed + self.intercept
        } else {
            self.slope * f64::from(raw) + self.intercept
        }
    }

    /// Physical value to the nearest raw code, saturating at the
    /// representable range. NaN maps to zero.
    pub fn to_raw(&self, physical: f64) -> u16 {
        let steps = (physical - self.intercept) / self.slope;
        if steps.is_nan() {
            return 0;
        }
        if self.bipolar {
            let magnitude = steps.abs().round().min(f64::from(MAGNITUDE_MASK)) as u16;
            if steps < 0.0 && magnitude != 0 {
                magnitude | SIGN_BIT
            } else {
                magnitude
            }
        } else {
            steps.round().clamp(0.0, f64::from(u16::MAX)) as u16
        }
    }

    /// Size of one ADU in physical units.
    pub fn step(&self) -> f64 {
        self.slope.abs()
    }
}

/// Volts to the TES DAC offset code.
pub fn voffset_to_adu(volts: f64) -> u16 {
    VOFFSET.to_raw(volts)
}

/// TES DAC offset code to volts.
pub fn adu_to_voffset(adu: u16) -> f64 {
    VOFFSET.to_physical(u32::from(adu))
}
