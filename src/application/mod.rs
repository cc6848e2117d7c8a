// ============================================================
// Layer 2 - Application / Use Cases
// ============================================================
// Workflow coordination only: no model math, no printing.

// The training workflow
pub mod train_use_case;

// Greedy translation with a trained checkpoint
pub mod translate_use_case;

// Random-input forward pass that reports the logits shape
pub mod shape_check_use_case;
