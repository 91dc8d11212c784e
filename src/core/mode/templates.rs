//! Prompt templater — one text template per (mode, action) pair, filled by
//! a small find-and-replace pass over `{{name}}` placeholders, in place of
//! a full templating crate: `get_prompt` elsewhere in this server builds
//! its own prompt text with a plain `format!` call, and this is the same
//! habit generalized to a larger, mode-dependent template set.

use crate::core::types::{Action, ThinkingMode};
use std::collections::HashMap;

pub struct TemplateContext {
    pub thought_number: u32,
    pub target_depth_max: u32,
    pub cursor_node_id: u64,
    pub branch_from_node_id: Option<u64>,
    pub backtrack_to_node_id: Option<u64>,
    pub convergence_score: f64,
    pub convergence_threshold: f64,
}

fn render(template: &str, vars: &HashMap<&str, String>) -> String {
    let mut out = template.to_string();
    for (key, value) in vars {
        out = out.replace(&format!("{{{{{key}}}}}"), value);
    }
    out
}

fn vars(ctx: &TemplateContext) -> HashMap<&'static str, String> {
    let mut vars = HashMap::new();
    vars.insert("thought_number", ctx.thought_number.to_string());
    vars.insert("target_depth_max", ctx.target_depth_max.to_string());
    vars.insert("cursor_node_id", ctx.cursor_node_id.to_string());
    vars.insert(
        "branch_from_node_id",
        ctx.branch_from_node_id.map(|id| id.to_string()).unwrap_or_else(|| "n/a".to_string()),
    );
    vars.insert(
        "backtrack_to_node_id",
        ctx.backtrack_to_node_id.map(|id| id.to_string()).unwrap_or_else(|| "n/a".to_string()),
    );
    vars.insert("convergence_score", format!("{:.2}", ctx.convergence_score));
    vars.insert("convergence_threshold", format!("{:.2}", ctx.convergence_threshold));
    vars
}

fn template_for(mode: ThinkingMode, action: Action) -> &'static str {
    match (mode, action) {
        (ThinkingMode::Fast, Action::Continue) => {
            "Thought {{thought_number}}: keep going toward a direct answer (target depth {{target_depth_max}})."
        }
        (ThinkingMode::Fast, Action::Conclude) => {
            "Thought {{thought_number}} reached the depth limit ({{target_depth_max}}). Wrap up with a final answer."
        }
        (ThinkingMode::Fast, Action::Evaluate) => {
            "Thought {{thought_number}}: score node {{cursor_node_id}} before moving on."
        }
        (ThinkingMode::Fast, _) => {
            "Thought {{thought_number}}: continue reasoning from node {{cursor_node_id}}."
        }

        (ThinkingMode::Expert, Action::Continue) => {
            "Thought {{thought_number}} (node {{cursor_node_id}}): develop this line further, target depth {{target_depth_max}}."
        }
        (ThinkingMode::Expert, Action::Branch) => {
            "Thought {{thought_number}}: branch from node {{branch_from_node_id}} to explore an alternative approach."
        }
        (ThinkingMode::Expert, Action::Backtrack) => {
            "Thought {{thought_number}}: this path is underperforming; backtrack to node {{backtrack_to_node_id}}."
        }
        (ThinkingMode::Expert, Action::Evaluate) => {
            "Thought {{thought_number}}: evaluate the candidates under node {{cursor_node_id}} before proceeding."
        }
        (ThinkingMode::Expert, Action::Conclude) => {
            "Thought {{thought_number}}: convergence score {{convergence_score}} has met the threshold {{convergence_threshold}}. Conclude."
        }

        (ThinkingMode::Deep, Action::Continue) => {
            "Thought {{thought_number}} (node {{cursor_node_id}}): push this line deeper, target depth {{target_depth_max}}."
        }
        (ThinkingMode::Deep, Action::Branch) => {
            "Thought {{thought_number}}: branch from node {{branch_from_node_id}} and explore broadly."
        }
        (ThinkingMode::Deep, Action::Backtrack) => {
            "Thought {{thought_number}}: node {{cursor_node_id}} has underperformed across repeated visits; backtrack to node {{backtrack_to_node_id}}."
        }
        (ThinkingMode::Deep, Action::Evaluate) => {
            "Thought {{thought_number}}: thoroughly evaluate the candidates under node {{cursor_node_id}}."
        }
        (ThinkingMode::Deep, Action::Conclude) => {
            "Thought {{thought_number}}: convergence score {{convergence_score}} has cleared the threshold {{convergence_threshold}} after deep exploration. Conclude."
        }
    }
}

pub fn render_prompt(mode: ThinkingMode, action: Action, ctx: &TemplateContext) -> String {
    let template = template_for(mode, action);
    render(template, &vars(ctx))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> TemplateContext {
        TemplateContext {
            thought_number: 3,
            target_depth_max: 10,
            cursor_node_id: 7,
            branch_from_node_id: Some(2),
            backtrack_to_node_id: Some(1),
            convergence_score: 0.8,
            convergence_threshold: 0.7,
        }
    }

    #[test]
    fn no_unreplaced_placeholders_survive_rendering() {
        let c = ctx();
        for mode in [ThinkingMode::Fast, ThinkingMode::Expert, ThinkingMode::Deep] {
            for action in [
                Action::Continue,
                Action::Branch,
                Action::Backtrack,
                Action::Evaluate,
                Action::Conclude,
            ] {
                let rendered = render_prompt(mode, action, &c);
                assert!(!rendered.contains("{{"), "leftover placeholder in {rendered}");
            }
        }
    }

    #[test]
    fn expert_conclude_mentions_convergence_numbers() {
        let rendered = render_prompt(ThinkingMode::Expert, Action::Conclude, &ctx());
        assert!(rendered.contains("0.80"));
        assert!(rendered.contains("0.70"));
    }
}
