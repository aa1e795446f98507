use crate::error::FieldError;
use crate::field::Field;
use anyhow::Result;
use log::{info, trace, warn};
use rayon::prelude::*;
use spatial_model_common::Snapshot;
use std::time::Instant;

/// Explicit Euler with the 5-point Laplacian is stable while `dt * D <= 1/4`.
const STABILITY_LIMIT: f64 = 0.25;

/// Per-pixel reaction rates, evaluated alongside diffusion each step.
pub trait ReactionTerm: Send + Sync {
    /// Number of species the term expects per pixel.
    fn species_count(&self) -> usize;

    /// Writes the reaction contribution to `dc/dt` for every compartment pixel.
    /// `conc` and `out` cover the compartment pixels only, in field layout.
    fn evaluate(&self, conc: &[f64], out: &mut [f64]);
}

/// No reactions: species only diffuse.
#[derive(Debug, Clone)]
pub struct NoReactions {
    pub n_species: usize,
}

impl ReactionTerm for NoReactions {
    fn species_count(&self) -> usize {
        self.n_species
    }

    fn evaluate(&self, _conc: &[f64], out: &mut [f64]) {
        out.fill(0.0);
    }
}

/// First-order loss of each species, `dc/dt = -rate[s] * c`.
#[derive(Debug, Clone)]
pub struct LinearDecay {
    pub rates: Vec<f64>,
}

impl ReactionTerm for LinearDecay {
    fn species_count(&self) -> usize {
        self.rates.len()
    }

    fn evaluate(&self, conc: &[f64], out: &mut [f64]) {
        let n = self.rates.len();
        out.par_chunks_mut(n)
            .zip(conc.par_chunks(n))
            .for_each(|(out, conc)| {
                for ((o, c), k) in out.iter_mut().zip(conc).zip(&self.rates) {
                    *o = -k * c;
                }
            });
    }
}

/// Advances a field in time with explicit Euler steps of diffusion plus reactions.
pub struct Simulation<'g> {
    field: Field<'g>,
    reaction: Box<dyn ReactionTerm>,
    dt: f64,
    /// The number of steps taken so far.
    current_time_step: u64,
    /// Scratch buffer for the reaction term, compartment pixels only.
    reaction_rates: Vec<f64>,
    /// Stores collected snapshots at record intervals.
    recorded_snapshots: Vec<Snapshot>,
}

impl<'g> Simulation<'g> {
    pub fn new(field: Field<'g>, reaction: Box<dyn ReactionTerm>, dt: f64) -> Result<Self> {
        if reaction.species_count() != field.species_count() {
            return Err(FieldError::SpeciesCountMismatch {
                expected: field.species_count(),
                found: reaction.species_count(),
            }
            .into());
        }
        if dt.is_nan() || dt <= 0.0 {
            anyhow::bail!("Timestep must be positive, got {}.", dt);
        }

        let max_diffusion = field.diffusion_constants().iter().cloned().fold(0.0, f64::max);
        if dt * max_diffusion > STABILITY_LIMIT {
            warn!(
                "dt * D = {:.3} exceeds the explicit Euler stability limit of {}; the solution may blow up.",
                dt * max_diffusion,
                STABILITY_LIMIT
            );
        }

        let reaction_rates = vec![0.0; field.species_count() * field.pixel_count()];
        Ok(Self {
            field,
            reaction,
            dt,
            current_time_step: 0,
            reaction_rates,
            recorded_snapshots: Vec::new(),
        })
    }

    pub fn field(&self) -> &Field<'g> {
        &self.field
    }

    pub fn current_time_step(&self) -> u64 {
        self.current_time_step
    }

    /// Current simulation time.
    pub fn time(&self) -> f64 {
        self.current_time_step as f64 * self.dt
    }

    /// Advances the field by one timestep: `conc += dt * (diffusion + reaction)`.
    /// The exterior slot is never advanced, so Dirichlet values stay fixed.
    pub fn step(&mut self) {
        let n_active = self.field.species_count() * self.field.pixel_count();

        self.field.diffusion_op();
        self.reaction
            .evaluate(&self.field.conc()[..n_active], &mut self.reaction_rates);

        let dt = self.dt;
        let (conc, dcdt) = self.field.conc_and_dcdt_mut();
        conc[..n_active]
            .par_iter_mut()
            .zip(dcdt[..n_active].par_iter())
            .zip(self.reaction_rates.par_iter())
            .for_each(|((c, diffusion), reaction)| {
                *c += dt * (diffusion + reaction);
            });

        self.current_time_step += 1;
    }

    /// Records the current mean concentration of every species.
    pub fn record_snapshot(&mut self) {
        let mean_concentrations = (0..self.field.species_count())
            .map(|s| self.field.mean_concentration(s))
            .collect();
        self.recorded_snapshots.push(Snapshot {
            time: self.time(),
            mean_concentrations,
        });
    }

    pub fn get_recorded_snapshots(&self) -> &[Snapshot] {
        &self.recorded_snapshots
    }

    /// Steps until `total_time`, recording a snapshot at the start, every
    /// `record_interval` and after the last step.
    pub fn run(&mut self, total_time: f64, record_interval: f64) {
        let total_steps = (total_time / self.dt).ceil().max(0.0) as u64;
        let mut record_interval_steps = (record_interval.max(0.0) / self.dt).round() as u64;
        if record_interval_steps == 0 {
            warn!(
                "Record interval ({:.3}) is smaller than the timestep ({:.3}). Recording every step.",
                record_interval, self.dt
            );
            record_interval_steps = 1;
        }
        info!(
            "Running {} steps of dt = {}, recording every {} steps.",
            total_steps, self.dt, record_interval_steps
        );

        let start_time = Instant::now();
        self.record_snapshot();

        for step in 0..total_steps {
            let step_start_time = Instant::now();
            self.step();
            trace!(
                "Step [{}/{}] completed in {:.3} ms",
                step + 1,
                total_steps,
                step_start_time.elapsed().as_secs_f64() * 1000.0
            );

            let is_record_step = (step + 1) % record_interval_steps == 0;
            let is_last_step = step + 1 == total_steps;
            if is_record_step || is_last_step {
                self.record_snapshot();
                info!(
                    "Step [{}/{}] (t = {:.3}) | Elapsed: {:.2} s",
                    step + 1,
                    total_steps,
                    self.time(),
                    start_time.elapsed().as_secs_f64()
                );
            }
        }
    }
}
