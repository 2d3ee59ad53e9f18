/// Built-in values used when neither the config file nor a flag sets a parameter.
///
/// Units follow the library defaults: ps, nm, yg, zJ and pN.
pub struct DefaultsConfig {
    pub cache_dir: &'static str,
    pub max_iterations: usize,
    pub force_tolerance: f64,
    pub timestep: f64,
    pub max_step: f64,
    pub temperature: f64,
    pub equilibration_frames: usize,
    pub production_frames: usize,
    pub frame_interval: f64,
    pub seed: u64,
    pub remove_drift: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            cache_dir: ".tether-cache",
            max_iterations: 1000,
            force_tolerance: 1e-2,
            timestep: 0.001,
            max_step: 0.001,
            temperature: 300.0,
            equilibration_frames: 100,
            production_frames: 500,
            frame_interval: 0.01,
            seed: 0,
            remove_drift: true,
        }
    }
}
