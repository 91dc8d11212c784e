use sequential_thinking_mcp::core::processor::Processor;
use sequential_thinking_mcp::core::types::{Action, Phase, ThinkingMode, ThoughtInput};
use sequential_thinking_mcp::EngineConfig;

fn thought(session: &str, n: u32, mode: ThinkingMode) -> ThoughtInput {
    ThoughtInput {
        text: format!("step {n}."),
        thought_number: n,
        total_thoughts: n,
        next_thought_needed: true,
        session_id: session.to_string(),
        branch_id: None,
        branch_from_thought: None,
        is_revision: false,
        revises_thought: None,
        evaluation_score: None,
        tags: Vec::new(),
        confidence: None,
        mode: Some(mode),
    }
}

#[test]
fn s1_fast_mode_concludes_at_depth() {
    let processor = Processor::new(EngineConfig::default());
    let mut last = None;
    for n in 1..=6 {
        last = Some(processor.process_thought(thought("s1", n, ThinkingMode::Fast)).unwrap());
    }
    let response = last.unwrap();
    assert_eq!(response.action, Action::Conclude);
    assert_eq!(response.phase, Phase::Concluded);
    assert_eq!(response.target_total_thoughts, 5);
    assert!(response.convergence_status.is_none());
    assert!(response.progress_overview.is_some());
}

#[test]
fn s2_expert_branches_at_decision_point() {
    let processor = Processor::new(EngineConfig::default());
    let mut last = None;
    for n in 1..=3 {
        last = Some(processor.process_thought(thought("s2", n, ThinkingMode::Expert)).unwrap());
    }
    let response = last.unwrap();

    assert_eq!(response.action, Action::Branch);
    let suggestion = response.branching_suggestion.expect("expected a branching suggestion");
    let cursor = processor.read_tree("s2").unwrap().into_iter().find(|n| n.thought_number == 3).unwrap().node_id;
    assert_eq!(suggestion.from_node_id, cursor);
    assert!(response.thought_prompt.contains(&cursor.to_string()));
}

#[test]
fn s3_expert_backtrack_on_low_score() {
    let processor = Processor::new(EngineConfig::default());
    for n in 1..=3 {
        processor.process_thought(thought("s3", n, ThinkingMode::Expert)).unwrap();
    }
    let nodes = processor.read_tree("s3").unwrap();
    let node3 = nodes.iter().find(|n| n.thought_number == 3).unwrap();
    let response = processor.evaluate("s3", node3.node_id, 0.2).unwrap();

    assert_eq!(response.action, Action::Backtrack);
    let suggestion = response.backtrack_suggestion.expect("expected a backtrack suggestion");
    assert!(response.thought_prompt.contains(&suggestion.to_node_id.to_string()));
}

#[test]
fn s4_deep_convergence_needs_high_scores() {
    let processor = Processor::new(EngineConfig::default());
    let mut last = None;
    for n in 1..=11 {
        last = Some(processor.process_thought(thought("s4", n, ThinkingMode::Deep)).unwrap());
    }
    let nodes = processor.read_tree("s4").unwrap();
    for node in nodes.iter().filter(|n| n.children.is_empty()) {
        processor.evaluate("s4", node.node_id, 0.6).unwrap();
    }
    let response = processor.get_guidance("s4", ThinkingMode::Deep).unwrap();
    let _ = last;

    let status = response.convergence_status.expect("deep mode always reports convergence status");
    assert!(!status.is_converged);
    assert_ne!(response.action, Action::Conclude);
}

#[test]
fn s5_rate_limit_gate_blocks_after_window() {
    use sequential_thinking_mcp::EngineError;

    let mut config = EngineConfig::default();
    config.max_requests_per_window = 5;
    let processor = Processor::new(config);
    for n in 1..=5 {
        assert!(processor.process_thought(thought("s5", n, ThinkingMode::Fast)).is_ok());
    }
    let result = processor.process_thought(thought("s5", 6, ThinkingMode::Fast));
    let err = result.unwrap_err();
    let resp = err.to_response();
    assert_eq!(resp.status_code, 429);
    assert!(matches!(err, EngineError::RateLimit { retry_after, .. } if retry_after > 0));
    assert_eq!(processor.tracker().active_count(), 1);
}

#[test]
fn s6_storage_overflow_is_rejected_without_growing_the_tree() {
    use sequential_thinking_mcp::EngineError;

    let mut config = EngineConfig::default();
    config.max_nodes_per_tree = 10;
    let processor = Processor::new(config);
    for n in 1..=10 {
        processor.process_thought(thought("s6", n, ThinkingMode::Fast)).unwrap();
    }
    let before = processor.read_tree("s6").unwrap().len();
    let result = processor.process_thought(thought("s6", 11, ThinkingMode::Fast));
    let err = result.unwrap_err();
    assert!(matches!(err, EngineError::BusinessLogic { ref message, .. } if message.contains("RESOURCE_EXHAUSTED")));
    let after = processor.read_tree("s6").unwrap().len();
    assert_eq!(before, after);
    assert_eq!(after, 10);
}

#[test]
fn validation_failure_leaves_state_unchanged() {
    let processor = Processor::new(EngineConfig::default());
    processor.process_thought(thought("s7", 1, ThinkingMode::Fast)).unwrap();
    let before = processor.store().history_len();

    let mut bad = thought("s7", 2, ThinkingMode::Fast);
    bad.text = "\n\x00\x1f".to_string();
    assert!(processor.process_thought(bad).is_err());

    assert_eq!(processor.store().history_len(), before);
}

#[test]
fn no_rendered_prompt_contains_leftover_placeholders() {
    let processor = Processor::new(EngineConfig::default());
    for mode in [ThinkingMode::Fast, ThinkingMode::Expert, ThinkingMode::Deep] {
        let session_id = format!("placeholder-check-{mode:?}");
        for n in 1..=4 {
            let response = processor.process_thought(thought(&session_id, n, mode)).unwrap();
            assert!(!response.thought_prompt.contains("{{"));
        }
    }
}

#[test]
fn no_emitted_string_contains_control_characters() {
    let processor = Processor::new(EngineConfig::default());
    let mut input = thought("s8", 1, ThinkingMode::Fast);
    input.text = "a thought with embedded\ncontrol\x01characters".to_string();
    let response = processor.process_thought(input).unwrap();
    assert!(response
        .thought_prompt
        .chars()
        .all(|c| !matches!(c, '\u{0}'..='\u{1F}' | '\u{7F}')));
}
