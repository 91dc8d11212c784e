//! Thinking-mode presets. `get_preset` returns an owned
//! copy so callers can't accidentally mutate the shared defaults.

use crate::core::types::ThinkingMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestStrategy {
    Exploit,
    Balanced,
    Explore,
}

#[derive(Debug, Clone, Copy)]
pub struct ModePreset {
    pub mode: ThinkingMode,
    pub exploration_constant: f64,
    pub suggest_strategy: SuggestStrategy,
    pub max_branching_factor: u32,
    pub target_depth_min: u32,
    pub target_depth_max: u32,
    pub auto_evaluate: bool,
    pub auto_eval_value: Option<f64>,
    pub enable_backtracking: bool,
    pub min_evaluations_before_converge: u32,
    pub convergence_threshold: f64,
    pub progress_overview_interval: u32,
    pub max_thought_display_length: usize,
    pub enable_critique: bool,
}

pub fn get_preset(mode: ThinkingMode) -> ModePreset {
    match mode {
        ThinkingMode::Fast => ModePreset {
            mode,
            exploration_constant: 0.5,
            suggest_strategy: SuggestStrategy::Exploit,
            max_branching_factor: 1,
            target_depth_min: 3,
            target_depth_max: 5,
            auto_evaluate: true,
            auto_eval_value: Some(0.7),
            enable_backtracking: false,
            min_evaluations_before_converge: 0,
            convergence_threshold: 0.0,
            progress_overview_interval: 3,
            max_thought_display_length: 150,
            enable_critique: false,
        },
        ThinkingMode::Expert => ModePreset {
            mode,
            exploration_constant: std::f64::consts::SQRT_2,
            suggest_strategy: SuggestStrategy::Balanced,
            max_branching_factor: 3,
            target_depth_min: 5,
            target_depth_max: 10,
            auto_evaluate: false,
            auto_eval_value: None,
            enable_backtracking: true,
            min_evaluations_before_converge: 3,
            convergence_threshold: 0.7,
            progress_overview_interval: 4,
            max_thought_display_length: 250,
            enable_critique: true,
        },
        ThinkingMode::Deep => ModePreset {
            mode,
            exploration_constant: 2.0,
            suggest_strategy: SuggestStrategy::Explore,
            max_branching_factor: 5,
            target_depth_min: 10,
            target_depth_max: 20,
            auto_evaluate: false,
            auto_eval_value: None,
            enable_backtracking: true,
            min_evaluations_before_converge: 5,
            convergence_threshold: 0.85,
            progress_overview_interval: 5,
            max_thought_display_length: 300,
            enable_critique: true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_match_the_table_for_each_mode() {
        let fast = get_preset(ThinkingMode::Fast);
        assert_eq!(fast.max_branching_factor, 1);
        assert_eq!(fast.min_evaluations_before_converge, 0);

        let expert = get_preset(ThinkingMode::Expert);
        assert!((expert.exploration_constant - std::f64::consts::SQRT_2).abs() < 1e-9);
        assert_eq!(expert.target_depth_min, 5);
        assert_eq!(expert.target_depth_max, 10);

        let deep = get_preset(ThinkingMode::Deep);
        assert_eq!(deep.max_branching_factor, 5);
        assert!((deep.convergence_threshold - 0.85).abs() < 1e-9);
    }

    #[test]
    fn get_preset_returns_independent_copies() {
        let mut a = get_preset(ThinkingMode::Fast);
        a.max_branching_factor = 99;
        let b = get_preset(ThinkingMode::Fast);
        assert_eq!(b.max_branching_factor, 1);
    }
}
