use numpy::{PyArray1, PyArray2, PyArrayMethods, PyReadonlyArray2};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};
use quadsim_shared::*;
use quadsim_sim::{DroneEnv, RenderMode, Renderer};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use rayon::prelude::*;

fn to_py_err(e: SimError) -> PyErr {
    match e {
        SimError::NotReset | SimError::EpisodeFinished => PyRuntimeError::new_err(e.to_string()),
        _ => PyValueError::new_err(e.to_string()),
    }
}

fn parse_mode(mode: &str) -> PyResult<RenderMode> {
    match mode {
        "human" => Ok(RenderMode::Human),
        "headless" | "rgb_array" => Ok(RenderMode::Headless),
        other => Err(PyValueError::new_err(format!("unknown render mode: {other}"))),
    }
}

fn info_dict<'py>(py: Python<'py>, info: &StepInfo) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new_bound(py);
    dict.set_item("captures", info.captures)?;
    dict.set_item("captured_this_step", info.captured_this_step)?;
    dict.set_item("elapsed_secs", info.elapsed_secs)?;
    dict.set_item("distance_to_target", info.distance_to_target)?;
    dict.set_item("wind_ax", info.wind.accel.x)?;
    dict.set_item("wind_ay", info.wind.accel.y)?;
    if let Some(reason) = info.termination {
        dict.set_item("termination", format!("{:?}", reason))?;
    }
    Ok(dict)
}

// ---------------------------------------------------------------------------
// Render hook bridged to a Python callable
// ---------------------------------------------------------------------------

/// Forwards frames to `callback(frame: dict, mode: str)`. A callback that
/// raises is reported once and then dropped, leaving rendering a no-op.
#[derive(Default)]
struct PyRenderer {
    callback: Option<PyObject>,
}

impl Renderer for PyRenderer {
    fn render(&mut self, frame: &ReplayFrame, mode: RenderMode) {
        let Some(callback) = &self.callback else {
            return;
        };
        let failed = Python::with_gil(|py| {
            let result = (|| -> PyResult<()> {
                let dict = PyDict::new_bound(py);
                dict.set_item("tick", frame.tick)?;
                dict.set_item("drone_x", frame.drone.x)?;
                dict.set_item("drone_y", frame.drone.y)?;
                dict.set_item("drone_angle", frame.drone.angle)?;
                dict.set_item("target_x", frame.target.x)?;
                dict.set_item("target_y", frame.target.y)?;
                dict.set_item("captures", frame.target.captures)?;
                dict.set_item("wind_ax", frame.wind_ax)?;
                dict.set_item("wind_ay", frame.wind_ay)?;
                let mode = match mode {
                    RenderMode::Human => "human",
                    RenderMode::Headless => "headless",
                };
                callback.call1(py, (dict, mode))?;
                Ok(())
            })();
            match result {
                Ok(()) => false,
                Err(e) => {
                    e.print(py);
                    true
                }
            }
        });
        if failed {
            self.callback = None;
        }
    }
}

// ---------------------------------------------------------------------------
// Single env
// ---------------------------------------------------------------------------

/// Gym-like environment wrapping the quadcopter sim.
///
/// Usage:
///     env = QuadEnv(wind_enabled=True, seed=42)
///     obs = env.reset()
///     obs, reward, done, info = env.step([0.0, 0.1])
#[pyclass(unsendable)]
struct QuadEnv {
    env: DroneEnv<PyRenderer>,
}

#[pymethods]
impl QuadEnv {
    #[new]
    #[pyo3(signature = (
        render_every_frame=false,
        mouse_target=false,
        wind_enabled=true,
        wind_dir_min_deg=WIND_DIR_MIN_DEG,
        wind_dir_max_deg=WIND_DIR_MAX_DEG,
        wind_speed_min=WIND_SPEED_MIN,
        wind_speed_max=WIND_SPEED_MAX,
        wind_update_every=WIND_UPDATE_EVERY,
        wind_dir_rw_std_deg=WIND_DIR_RW_STD_DEG,
        wind_speed_rw_std=WIND_SPEED_RW_STD,
        sensor_noise_enabled=true,
        sensor_noise_std=None,
        seed=0,
        render_callback=None,
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        render_every_frame: bool,
        mouse_target: bool,
        wind_enabled: bool,
        wind_dir_min_deg: f32,
        wind_dir_max_deg: f32,
        wind_speed_min: f32,
        wind_speed_max: f32,
        wind_update_every: u32,
        wind_dir_rw_std_deg: f32,
        wind_speed_rw_std: f32,
        sensor_noise_enabled: bool,
        sensor_noise_std: Option<Vec<f32>>,
        seed: u64,
        render_callback: Option<PyObject>,
    ) -> PyResult<Self> {
        let sensor_noise = match sensor_noise_std {
            Some(std) => SensorNoiseConfig::from_slice(sensor_noise_enabled, &std).map_err(to_py_err)?,
            None => SensorNoiseConfig {
                enabled: sensor_noise_enabled,
                ..SensorNoiseConfig::default()
            },
        };
        let config = EnvConfig {
            render_every_frame,
            mouse_target,
            wind: WindConfig {
                enabled: wind_enabled,
                dir_min_deg: wind_dir_min_deg,
                dir_max_deg: wind_dir_max_deg,
                speed_min: wind_speed_min,
                speed_max: wind_speed_max,
                update_every: wind_update_every,
                dir_rw_std_deg: wind_dir_rw_std_deg,
                speed_rw_std: wind_speed_rw_std,
            },
            sensor_noise,
        };
        let renderer = PyRenderer {
            callback: render_callback,
        };
        let env = DroneEnv::with_renderer(config, seed, renderer).map_err(to_py_err)?;
        Ok(Self { env })
    }

    /// Build from a curriculum level (0, 1, 2).
    #[staticmethod]
    #[pyo3(signature = (level, seed=0))]
    fn from_level(level: u32, seed: u64) -> PyResult<Self> {
        let env = DroneEnv::with_renderer(EnvConfig::curriculum(level), seed, PyRenderer::default())
            .map_err(to_py_err)?;
        Ok(Self { env })
    }

    /// Reset the environment. Returns observation (list of 7 floats).
    #[pyo3(signature = (seed=None))]
    fn reset(&mut self, seed: Option<u64>) -> Vec<f32> {
        let obs = match seed {
            Some(s) => self.env.reset_with_seed(s),
            None => self.env.reset(),
        };
        obs.data.to_vec()
    }

    /// Step the environment with an action [collective, differential].
    /// Returns (obs, reward, done, info_dict).
    fn step<'py>(
        &mut self,
        py: Python<'py>,
        action: Vec<f32>,
    ) -> PyResult<(Vec<f32>, f32, bool, Bound<'py, PyDict>)> {
        let result = self.env.step_raw(&action).map_err(to_py_err)?;
        let info = info_dict(py, &result.info)?;
        Ok((result.observation.data.to_vec(), result.reward, result.done, info))
    }

    #[pyo3(signature = (mode="human"))]
    fn render(&mut self, mode: &str) -> PyResult<()> {
        let mode = parse_mode(mode)?;
        self.env.render(mode);
        Ok(())
    }

    /// Attach or clear the Python render callback.
    fn set_render_callback(&mut self, callback: Option<PyObject>) {
        self.env.renderer_mut().callback = callback;
    }

    /// Pointer position for mouse-target mode.
    fn set_pointer(&mut self, x: f32, y: f32) {
        self.env.set_pointer(glam::Vec2::new(x, y));
    }

    #[getter]
    fn obs_size(&self) -> usize {
        OBS_SIZE
    }

    #[getter]
    fn action_size(&self) -> usize {
        ACTION_SIZE
    }

    #[getter]
    fn captures(&self) -> u32 {
        self.env.target().captures
    }

    #[getter]
    fn elapsed_secs(&self) -> f32 {
        self.env.clock().elapsed_secs()
    }

    /// Return the configuration as a JSON string.
    #[getter]
    fn config_json(&self) -> PyResult<String> {
        serde_json::to_string(self.env.config()).map_err(|e| PyValueError::new_err(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// BatchEnv: Rayon-parallelized vectorized environment
// ---------------------------------------------------------------------------

/// Vectorized environment that steps all N envs in parallel using Rayon.
/// Finished envs auto-reset; their `dones` entry is set and the returned
/// observation is the first one of the new episode.
///
/// Usage:
///     batch = BatchEnv(64, seed=0, level=0)
///     obs = batch.reset()                              # (64, 7)
///     obs, rewards, dones, infos = batch.step(actions) # actions: (64, 2)
#[pyclass(unsendable)]
struct BatchEnv {
    envs: Vec<DroneEnv>,
    n_envs: usize,
    config: EnvConfig,
    rng: Pcg64,
}

/// Reset one env, first switching it to `config` if the batch moved on.
fn reset_env(env: &mut DroneEnv, config: &EnvConfig, seed: u64) -> SimResult<[f32; OBS_SIZE]> {
    if env.config() != config {
        env.set_config(*config)?;
    }
    Ok(env.reset_with_seed(seed).data)
}

#[pymethods]
impl BatchEnv {
    #[new]
    #[pyo3(signature = (n_envs, seed=0, level=None))]
    fn new(n_envs: usize, seed: u64, level: Option<u32>) -> PyResult<Self> {
        if n_envs == 0 {
            return Err(PyValueError::new_err("n_envs must be >= 1"));
        }
        let config = level.map(EnvConfig::curriculum).unwrap_or_default();
        let mut rng = Pcg64::seed_from_u64(seed);
        let envs = (0..n_envs)
            .map(|_| DroneEnv::new(config, rng.gen::<u64>()))
            .collect::<SimResult<Vec<_>>>()
            .map_err(to_py_err)?;

        Ok(Self {
            envs,
            n_envs,
            config,
            rng,
        })
    }

    /// Switch every env to a curriculum level; applied at each env's next reset.
    fn set_curriculum_level(&mut self, level: u32) {
        self.config = EnvConfig::curriculum(level);
    }

    /// Reset all environments. Returns obs as numpy array (n_envs, OBS_SIZE).
    fn reset<'py>(&mut self, py: Python<'py>) -> PyResult<Bound<'py, PyArray2<f32>>> {
        // Generate seeds sequentially so the batch stays reproducible
        let seeds: Vec<u64> = (0..self.n_envs).map(|_| self.rng.gen()).collect();
        let config = self.config;

        let obs_arrays = self
            .envs
            .par_iter_mut()
            .zip(seeds.into_par_iter())
            .map(|(env, seed)| reset_env(env, &config, seed))
            .collect::<SimResult<Vec<_>>>()
            .map_err(to_py_err)?;

        let obs_py = PyArray2::<f32>::zeros_bound(py, [self.n_envs, OBS_SIZE], false);
        unsafe {
            let buf = obs_py.as_slice_mut()?;
            for (i, obs) in obs_arrays.iter().enumerate() {
                buf[i * OBS_SIZE..(i + 1) * OBS_SIZE].copy_from_slice(obs);
            }
        }
        Ok(obs_py)
    }

    /// Step all environments in parallel.
    ///
    /// Args:
    ///     actions: numpy array (n_envs, ACTION_SIZE) float32
    ///
    /// Returns: (obs, rewards, dones, infos)
    ///     obs:     numpy (n_envs, OBS_SIZE) float32
    ///     rewards: numpy (n_envs,) float32
    ///     dones:   numpy (n_envs,) bool
    ///     infos:   list of n_envs dicts
    fn step<'py>(
        &mut self,
        py: Python<'py>,
        actions: PyReadonlyArray2<f32>,
    ) -> PyResult<(
        Bound<'py, PyArray2<f32>>,
        Bound<'py, PyArray1<f32>>,
        Bound<'py, PyArray1<bool>>,
        Bound<'py, PyList>,
    )> {
        let actions_arr = actions.as_array();
        if actions_arr.shape() != [self.n_envs, ACTION_SIZE] {
            return Err(PyValueError::new_err(format!(
                "expected actions shape ({}, {}), got {:?}",
                self.n_envs,
                ACTION_SIZE,
                actions_arr.shape()
            )));
        }

        let parsed = (0..self.n_envs)
            .map(|i| {
                let row = actions_arr.row(i);
                Action::try_from_slice(&[row[0], row[1]])
            })
            .collect::<SimResult<Vec<_>>>()
            .map_err(to_py_err)?;

        let results = self
            .envs
            .par_iter_mut()
            .zip(parsed.into_par_iter())
            .map(|(env, action)| env.step(action))
            .collect::<SimResult<Vec<StepResult>>>()
            .map_err(to_py_err)?;

        let reset_seeds: Vec<Option<u64>> = results
            .iter()
            .map(|r| r.done.then(|| self.rng.gen()))
            .collect();

        let config = self.config;
        let reset_obs = self
            .envs
            .par_iter_mut()
            .zip(reset_seeds.into_par_iter())
            .map(|(env, seed)| seed.map(|s| reset_env(env, &config, s)).transpose())
            .collect::<SimResult<Vec<Option<[f32; OBS_SIZE]>>>>()
            .map_err(to_py_err)?;

        let obs_py = PyArray2::<f32>::zeros_bound(py, [self.n_envs, OBS_SIZE], false);
        let rew_py = PyArray1::<f32>::zeros_bound(py, self.n_envs, false);
        let done_py = PyArray1::<bool>::zeros_bound(py, self.n_envs, false);
        let info_list = PyList::empty_bound(py);

        unsafe {
            let obs_buf = obs_py.as_slice_mut()?;
            let rew_buf = rew_py.as_slice_mut()?;
            let done_buf = done_py.as_slice_mut()?;

            for (i, result) in results.iter().enumerate() {
                let obs_data = reset_obs[i].as_ref().unwrap_or(&result.observation.data);
                obs_buf[i * OBS_SIZE..(i + 1) * OBS_SIZE].copy_from_slice(obs_data);
                rew_buf[i] = result.reward;
                done_buf[i] = result.done;
            }
        }

        for result in results.iter() {
            let info = info_dict(py, &result.info)?;
            if result.done {
                info.set_item("terminal_observation", result.observation.data.to_vec())?;
            }
            info_list.append(info)?;
        }

        Ok((obs_py, rew_py, done_py, info_list))
    }

    /// Number of environments.
    #[getter]
    fn n(&self) -> usize {
        self.n_envs
    }

    #[getter]
    fn obs_size(&self) -> usize {
        OBS_SIZE
    }

    #[getter]
    fn action_size(&self) -> usize {
        ACTION_SIZE
    }
}

/// Python module definition.
#[pymodule]
fn quadsim_pyenv(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<QuadEnv>()?;
    m.add_class::<BatchEnv>()?;
    m.add("OBS_SIZE", OBS_SIZE)?;
    m.add("ACTION_SIZE", ACTION_SIZE)?;
    m.add("FPS", FPS)?;
    m.add("SUBSTEPS_PER_STEP", SUBSTEPS_PER_STEP)?;
    Ok(())
}
