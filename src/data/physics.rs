/// Physical constants used for unit conversion.
///
/// A single frozen instance, [`PHYSICS`], is shared read-only by every
/// decoder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicalConstants {
    /// Elementary charge [A·s].
    pub elementary_charge: f64,
    /// Planck's constant [J·s].
    pub planck: f64,
    /// Boltzmann constant [J/K].
    pub boltzmann: f64,
    /// Speed of light in vacuum [m/s].
    pub speed_of_light: f64,
    /// Reference temperature [K].
    pub temperature: f64,
}

pub const PHYSICS: PhysicalConstants = PhysicalConstants {
    elementary_charge: 1.602176462e-19,
    planck: 6.62606876e-34,
    boltzmann: 1.38064852e-23,
    speed_of_light: 299_792_458.0,
    temperature: 300.0,
};

impl PhysicalConstants {
    /// Thermal voltage kT/q [V], about 25.8 mV at 300 K.
    pub fn thermal_voltage(&self) -> f64 {
        self.boltzmann * self.temperature / self.elementary_charge
    }

    /// h·c/q scaled to [eV·nm].
    pub fn hc_ev_nm(&self) -> f64 {
        self.planck * self.speed_of_light / self.elementary_charge * 1e9
    }

    /// Photon energy in eV for a wavelength in nm.
    pub fn wavelength_to_ev(&self, nm: f64) -> f64 {
        self.hc_ev_nm() / nm
    }
}
