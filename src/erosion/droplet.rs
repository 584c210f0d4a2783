//! Single droplet trace: steepest descent across grid neighbours, eroding
//! and depositing as it goes.

use glam::Vec3;

use super::ErosionConfig;
use crate::terrain::HeightBuffer;

/// Why a trace stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// No lower neighbour. Carried sediment was deposited in place.
    Basin,
    /// Capacity dropped below zero. Carried sediment was discarded.
    CapacityExhausted,
    /// `max_steps_per_drop` reached. Carried sediment was deposited in place.
    StepLimit,
}

/// State of a droplet between steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceState {
    Flowing,
    Terminated(Termination),
}

/// Summary of one finished trace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceOutcome {
    pub termination: Termination,
    /// Number of neighbourhood evaluations (moves plus a final basin check).
    pub steps: u32,
    /// Vertex the droplet ended on.
    pub end_index: usize,
    /// Total height removed from the grid.
    pub eroded: f64,
    /// Total height added to the grid.
    pub deposited: f64,
    /// Sediment lost on capacity exhaustion.
    pub discarded: f64,
}

/// A simulated water particle.
#[derive(Debug, Clone)]
pub struct Droplet {
    index: usize,
    sediment: f32,
    capacity: f32,
    steps: u32,
    eroded: f64,
    deposited: f64,
    state: TraceState,
}

impl Droplet {
    /// A droplet at `start` with no sediment and its own capacity budget.
    pub fn new(start: usize, capacity: f32) -> Self {
        Self {
            index: start,
            sediment: 0.0,
            capacity,
            steps: 0,
            eroded: 0.0,
            deposited: 0.0,
            state: TraceState::Flowing,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn sediment(&self) -> f32 {
        self.sediment
    }

    pub fn capacity(&self) -> f32 {
        self.capacity
    }

    pub fn state(&self) -> TraceState {
        self.state
    }

    /// Runs a full trace from `start`, mutating `grid` in place.
    pub fn trace<B>(grid: &mut B, start: usize, config: &ErosionConfig) -> TraceOutcome
    where
        B: HeightBuffer + ?Sized,
    {
        let mut droplet = Droplet::new(start, config.capacity);
        let mut discarded = 0.0f64;

        let termination = loop {
            if let TraceState::Terminated(reason) = droplet.state {
                break reason;
            }
            // A pending capacity stop is taken by `step` without moving, so it
            // wins over the step limit.
            let capacity_spent = !(droplet.capacity >= 0.0);
            if droplet.steps >= config.max_steps_per_drop && !capacity_spent {
                log::warn!(
                    "droplet from vertex {} stopped after {} steps at vertex {}",
                    start,
                    droplet.steps,
                    droplet.index
                );
                droplet.deposit_remaining(grid);
                droplet.state = TraceState::Terminated(Termination::StepLimit);
                continue;
            }
            if droplet.step(grid, config) == TraceState::Terminated(Termination::CapacityExhausted) {
                discarded = droplet.sediment as f64;
            }
        };

        log::trace!(
            "droplet {} -> {}: {:?} after {} steps",
            start,
            droplet.index,
            termination,
            droplet.steps
        );

        TraceOutcome {
            termination,
            steps: droplet.steps,
            end_index: droplet.index,
            eroded: droplet.eroded,
            deposited: droplet.deposited,
            discarded,
        }
    }

    /// Advances the droplet by one transition.
    ///
    /// Does nothing once the droplet has terminated.
    pub fn step<B>(&mut self, grid: &mut B, config: &ErosionConfig) -> TraceState
    where
        B: HeightBuffer + ?Sized,
    {
        if self.state != TraceState::Flowing {
            return self.state;
        }
        // NaN capacity also ends the trace.
        if !(self.capacity >= 0.0) {
            self.state = TraceState::Terminated(Termination::CapacityExhausted);
            return self.state;
        }

        self.steps += 1;
        let current = self.index;
        let lowest = lowest_neighbor(&*grid, current);
        let delta_y = descent_steepness(grid.position(current), grid.position(lowest));

        if !(delta_y > 0.0) {
            self.deposit_remaining(grid);
            self.state = TraceState::Terminated(Termination::Basin);
            return self.state;
        }

        let mut deposit = self.sediment * config.deposition_rate * delta_y;
        let erosion = (config.erosion_rate * (1.0 - delta_y)).min(delta_y);
        self.sediment += delta_y.min(erosion) - deposit;
        self.capacity *= config.evaporation_rate * delta_y;

        if self.sediment > self.capacity {
            deposit += self.sediment - self.capacity;
            self.sediment = self.capacity;
        } else {
            self.capacity -= self.sediment;
        }

        let mut height = grid.height(current);
        height -= erosion;
        height += deposit;
        grid.set_height(current, height);

        self.eroded += erosion as f64;
        self.deposited += deposit as f64;
        self.index = lowest;
        self.state
    }

    fn deposit_remaining<B>(&mut self, grid: &mut B)
    where
        B: HeightBuffer + ?Sized,
    {
        let height = grid.height(self.index) + self.sediment;
        grid.set_height(self.index, height);
        self.deposited += self.sediment as f64;
        self.sediment = 0.0;
    }
}

/// Lowest of `index` and its neighbours.
///
/// A neighbour must be strictly lower to win, so the current vertex is kept
/// on ties and equal neighbours resolve to the first in north, south, west,
/// east order.
pub fn lowest_neighbor<B>(grid: &B, index: usize) -> usize
where
    B: HeightBuffer + ?Sized,
{
    let mut lowest = index;
    let mut lowest_height = grid.height(index);

    for neighbor in grid.neighbors_4(index).into_iter().flatten() {
        let height = grid.height(neighbor);
        if height < lowest_height {
            lowest = neighbor;
            lowest_height = height;
        }
    }

    lowest
}

/// Vertical component of the unit vector from `to` up to `from`.
///
/// Positive when `to` is below `from`; zero when they coincide or sit level.
pub fn descent_steepness(from: Vec3, to: Vec3) -> f32 {
    (from - to).normalize_or_zero().y
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::HeightGrid;

    const BOWL: [f32; 9] = [5.0, 5.0, 5.0, 5.0, 0.0, 5.0, 5.0, 5.0, 5.0];

    fn bowl_config() -> ErosionConfig {
        ErosionConfig {
            drop_count: 1,
            seed: "seed".to_string(),
            capacity: 30.0,
            erosion_rate: 1.0,
            deposition_rate: 1.0,
            evaporation_rate: 0.1,
            max_steps_per_drop: 10_000,
        }
    }

    // Erosion of the single downhill move from an edge vertex into the bowl:
    // the move drops 5 over a horizontal distance of 1.
    fn edge_erosion() -> f32 {
        1.0 - 5.0 / 26.0f32.sqrt()
    }

    #[test]
    fn test_lowest_neighbor_prefers_strictly_lower() {
        let grid = HeightGrid::from_heights(3, &BOWL, 1.0);
        assert_eq!(lowest_neighbor(&grid, 1), 4);
        assert_eq!(lowest_neighbor(&grid, 4), 4);
        // Level neighbours never beat the current vertex.
        assert_eq!(lowest_neighbor(&grid, 0), 0);
    }

    #[test]
    fn test_lowest_neighbor_tie_order() {
        // North (1) and west (3) of vertex 4 tie; north comes first.
        let heights = [9.0, 1.0, 9.0, 1.0, 5.0, 9.0, 9.0, 9.0, 9.0];
        let grid = HeightGrid::from_heights(3, &heights, 1.0);
        assert_eq!(lowest_neighbor(&grid, 4), 1);
    }

    #[test]
    fn test_descent_steepness() {
        assert_eq!(descent_steepness(Vec3::ZERO, Vec3::ZERO), 0.0);
        assert_eq!(descent_steepness(Vec3::new(0.0, 1.0, 0.0), Vec3::new(1.0, 1.0, 0.0)), 0.0);
        let s = descent_steepness(Vec3::new(0.0, 1.0, 0.0), Vec3::new(1.0, 0.0, 0.0));
        assert!((s - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);
    }

    #[test]
    fn test_local_minimum_terminates_in_one_step() {
        let mut grid = HeightGrid::from_heights(3, &BOWL, 1.0);
        let outcome = Droplet::trace(&mut grid, 4, &bowl_config());

        assert_eq!(outcome.termination, Termination::Basin);
        assert_eq!(outcome.steps, 1);
        assert_eq!(outcome.end_index, 4);
        assert_eq!(outcome.deposited, 0.0);
        assert_eq!(grid.heights(), BOWL.to_vec());
    }

    #[test]
    fn test_corner_on_plateau_does_not_move() {
        // Both neighbours of the corner are level with it, so there is no
        // downhill move and the zero sediment is deposited in place.
        let mut grid = HeightGrid::from_heights(3, &BOWL, 1.0);
        let outcome = Droplet::trace(&mut grid, 0, &bowl_config());

        assert_eq!(outcome.termination, Termination::Basin);
        assert_eq!(outcome.steps, 1);
        assert_eq!(outcome.end_index, 0);
        assert_eq!(grid.heights(), BOWL.to_vec());
    }

    #[test]
    fn test_edge_drop_flows_into_bowl() {
        let mut grid = HeightGrid::from_heights(3, &BOWL, 1.0);
        let outcome = Droplet::trace(&mut grid, 1, &bowl_config());
        let e = edge_erosion();

        assert_eq!(outcome.termination, Termination::Basin);
        assert_eq!(outcome.steps, 2);
        assert_eq!(outcome.end_index, 4);

        let heights = grid.heights();
        assert!((heights[1] - (5.0 - e)).abs() < 1e-5, "h[1] = {}", heights[1]);
        assert!((heights[4] - e).abs() < 1e-5, "h[4] = {}", heights[4]);
        for i in [0, 2, 3, 5, 6, 7, 8] {
            assert_eq!(heights[i], 5.0, "vertex {} should be untouched", i);
        }
        assert!((outcome.eroded - e as f64).abs() < 1e-6);
        assert!((outcome.deposited - e as f64).abs() < 1e-6);
    }

    #[test]
    fn test_first_step_state() {
        let mut grid = HeightGrid::from_heights(3, &BOWL, 1.0);
        let config = bowl_config();
        let mut droplet = Droplet::new(1, config.capacity);
        let e = edge_erosion();
        let delta_y = 5.0 / 26.0f32.sqrt();

        assert_eq!(droplet.step(&mut grid, &config), TraceState::Flowing);
        assert_eq!(droplet.index(), 4);
        assert!((droplet.sediment() - e).abs() < 1e-6);
        let expected_capacity = 30.0 * 0.1 * delta_y - e;
        assert!((droplet.capacity() - expected_capacity).abs() < 1e-4);
    }

    #[test]
    fn test_negative_capacity_discards_sediment() {
        let mut grid = HeightGrid::from_heights(3, &BOWL, 1.0);
        let config = ErosionConfig {
            evaporation_rate: -1.0,
            ..bowl_config()
        };
        let outcome = Droplet::trace(&mut grid, 1, &config);

        assert_eq!(outcome.termination, Termination::CapacityExhausted);
        assert_eq!(outcome.end_index, 4);
        assert!(outcome.discarded != 0.0);
        // Unlike a basin stop, nothing lands on the final vertex.
        assert_eq!(grid.height(4), 0.0);
    }

    #[test]
    fn test_negative_initial_capacity_never_steps() {
        let mut grid = HeightGrid::from_heights(3, &BOWL, 1.0);
        let config = ErosionConfig {
            capacity: -1.0,
            ..bowl_config()
        };
        let outcome = Droplet::trace(&mut grid, 1, &config);

        assert_eq!(outcome.termination, Termination::CapacityExhausted);
        assert_eq!(outcome.steps, 0);
        assert_eq!(grid.heights(), BOWL.to_vec());
    }

    #[test]
    fn test_step_limit_deposits_sediment() {
        let mut grid = HeightGrid::from_heights(3, &BOWL, 1.0);
        let config = ErosionConfig {
            max_steps_per_drop: 1,
            ..bowl_config()
        };
        let outcome = Droplet::trace(&mut grid, 1, &config);
        let e = edge_erosion();

        assert_eq!(outcome.termination, Termination::StepLimit);
        assert_eq!(outcome.steps, 1);
        assert!((grid.height(4) - e).abs() < 1e-5);
    }

    #[test]
    fn test_capacity_stop_wins_over_step_limit() {
        let spent = ErosionConfig {
            evaporation_rate: -1.0,
            ..bowl_config()
        };
        let mut unlimited = HeightGrid::from_heights(3, &BOWL, 1.0);
        let expected = Droplet::trace(&mut unlimited, 1, &spent);

        // Capacity goes negative on the only allowed step.
        let mut limited = HeightGrid::from_heights(3, &BOWL, 1.0);
        let config = ErosionConfig {
            max_steps_per_drop: 1,
            ..spent
        };
        let outcome = Droplet::trace(&mut limited, 1, &config);

        assert_eq!(outcome.termination, Termination::CapacityExhausted);
        assert_eq!(outcome.steps, 1);
        assert_eq!(outcome, expected);
        assert_eq!(limited.height(4), 0.0);
        assert_eq!(limited.heights(), unlimited.heights());
    }

    #[test]
    fn test_single_vertex_grid() {
        let mut grid = HeightGrid::from_heights(1, &[2.0], 1.0);
        let outcome = Droplet::trace(&mut grid, 0, &bowl_config());

        assert_eq!(outcome.termination, Termination::Basin);
        assert_eq!(outcome.steps, 1);
        assert_eq!(grid.height(0), 2.0);
    }

    #[test]
    fn test_step_after_termination_is_inert() {
        let mut grid = HeightGrid::from_heights(3, &BOWL, 1.0);
        let config = bowl_config();
        let mut droplet = Droplet::new(4, config.capacity);

        let state = droplet.step(&mut grid, &config);
        assert_eq!(state, TraceState::Terminated(Termination::Basin));
        assert_eq!(droplet.step(&mut grid, &config), state);
        assert_eq!(grid.heights(), BOWL.to_vec());
    }
}
