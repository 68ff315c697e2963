/*
 * neural_net.rs
 * Part of the byte-gammon project
 * Created Date: Friday, March 21st 2025
 * Author: Paul Tsouchlos (DeveloperPaul123) (developer.paul.123@gmail.com)
 * -----
 * Last Modified: Tue Jul 1 2025
 * -----
 * Copyright (c) 2025 Paul Tsouchlos (DeveloperPaul123)
 * GNU General Public License v3.0 or later
 * https://www.gnu.org/licenses/gpl-3.0-standalone.html
 *
 */

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum NetError {
    #[error("layer sizes must be positive")]
    InvalidShape,
    #[error("gain constants must be positive")]
    InvalidGain,
    #[error("weight vector has the wrong length")]
    WrongWeightCount,
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + x.exp())
}

/// A fully-connected network with one hidden layer and sigmoid activations
/// at both layers: `sigmoid(-beta * z)` with per-layer gain constants.
/// Outputs are guaranteed to lie in [0, 1].
#[derive(Debug)]
pub struct NeuralNet {
    num_inputs: usize,
    num_hidden: usize,
    num_outputs: usize,
    beta_hidden: f32,
    beta_output: f32,
    /// Input-major: the weights of input `i` towards all hidden nodes are
    /// contiguous, so sparse inputs skip whole rows.
    hidden_weights: Vec<f32>,
    /// Output-major: `[output][hidden]`.
    output_weights: Vec<f32>,
    hidden_thresholds: Vec<f32>,
    output_thresholds: Vec<f32>,
}

impl NeuralNet {
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        num_inputs: usize,
        num_hidden: usize,
        num_outputs: usize,
        beta_hidden: f32,
        beta_output: f32,
        hidden_weights: Vec<f32>,
        output_weights: Vec<f32>,
        hidden_thresholds: Vec<f32>,
        output_thresholds: Vec<f32>,
    ) -> Result<NeuralNet, NetError> {
        if num_inputs == 0 || num_hidden == 0 || num_outputs == 0 {
            return Err(NetError::InvalidShape);
        }
        if beta_hidden <= 0.0 || beta_output <= 0.0 {
            return Err(NetError::InvalidGain);
        }
        if hidden_weights.len() != num_inputs * num_hidden
            || output_weights.len() != num_outputs * num_hidden
            || hidden_thresholds.len() != num_hidden
            || output_thresholds.len() != num_outputs
        {
            return Err(NetError::WrongWeightCount);
        }
        Ok(NeuralNet {
            num_inputs,
            num_hidden,
            num_outputs,
            beta_hidden,
            beta_output,
            hidden_weights,
            output_weights,
            hidden_thresholds,
            output_thresholds,
        })
    }

    pub fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    pub fn num_hidden(&self) -> usize {
        self.num_hidden
    }

    pub fn num_outputs(&self) -> usize {
        self.num_outputs
    }

    pub fn beta_hidden(&self) -> f32 {
        self.beta_hidden
    }

    pub fn beta_output(&self) -> f32 {
        self.beta_output
    }

    pub fn hidden_weights(&self) -> &[f32] {
        &self.hidden_weights
    }

    pub fn output_weights(&self) -> &[f32] {
        &self.output_weights
    }

    pub fn hidden_thresholds(&self) -> &[f32] {
        &self.hidden_thresholds
    }

    pub fn output_thresholds(&self) -> &[f32] {
        &self.output_thresholds
    }

    /// Plain full evaluation.
    pub fn evaluate(&self, inputs: &[f32], outputs: &mut [f32]) {
        let mut hidden = self.hidden_thresholds.clone();
        self.accumulate_hidden(inputs, &mut hidden);
        self.finish(&mut hidden, outputs);
    }

    /// Evaluation driven by the incremental state machine in `state`:
    /// the first call on a fresh branch computes fully and saves the input
    /// vector and pre-activation hidden sums; later calls apply only the
    /// changed input coordinates to the saved sums. Falls back to a full
    /// evaluation when the saved width does not match this net.
    pub fn evaluate_with(&self, inputs: &[f32], outputs: &mut [f32], state: &mut NetState) {
        match state.next_action() {
            NetAction::Full => self.evaluate(inputs, outputs),
            NetAction::Save => {
                state.saved_inputs.clear();
                state.saved_inputs.extend_from_slice(inputs);
                let mut hidden = self.hidden_thresholds.clone();
                self.accumulate_hidden(inputs, &mut hidden);
                state.saved_base.clear();
                state.saved_base.extend_from_slice(&hidden);
                self.finish(&mut hidden, outputs);
            }
            NetAction::FromBase => {
                if state.saved_inputs.len() != self.num_inputs {
                    self.evaluate(inputs, outputs);
                    return;
                }
                let mut hidden = state.saved_base.clone();
                for (i, (&x, &saved)) in inputs.iter().zip(state.saved_inputs.iter()).enumerate() {
                    let diff = x - saved;
                    if diff == 0.0 {
                        continue;
                    }
                    let row = &self.hidden_weights[i * self.num_hidden..(i + 1) * self.num_hidden];
                    if diff == 1.0 {
                        for (h, &w) in hidden.iter_mut().zip(row) {
                            *h += w;
                        }
                    } else if diff == -1.0 {
                        for (h, &w) in hidden.iter_mut().zip(row) {
                            *h -= w;
                        }
                    } else {
                        for (h, &w) in hidden.iter_mut().zip(row) {
                            *h += w * diff;
                        }
                    }
                }
                self.finish(&mut hidden, outputs);
            }
        }
    }

    fn accumulate_hidden(&self, inputs: &[f32], hidden: &mut [f32]) {
        for (i, &x) in inputs.iter().enumerate() {
            if x == 0.0 {
                continue;
            }
            let row = &self.hidden_weights[i * self.num_hidden..(i + 1) * self.num_hidden];
            if x == 1.0 {
                for (h, &w) in hidden.iter_mut().zip(row) {
                    *h += w;
                }
            } else {
                for (h, &w) in hidden.iter_mut().zip(row) {
                    *h += w * x;
                }
            }
        }
    }

    /// Applies the hidden sigmoid and the output layer.
    fn finish(&self, hidden: &mut [f32], outputs: &mut [f32]) {
        for h in hidden.iter_mut() {
            *h = sigmoid(-self.beta_hidden * *h);
        }
        for (o, out) in outputs.iter_mut().enumerate().take(self.num_outputs) {
            let row = &self.output_weights[o * self.num_hidden..(o + 1) * self.num_hidden];
            let mut r = self.output_thresholds[o];
            for (&h, &w) in hidden.iter().zip(row) {
                r += h * w;
            }
            *out = sigmoid(-self.beta_output * r);
        }
    }
}

enum NetAction {
    Full,
    Save,
    FromBase,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
enum IncrementalState {
    /// Incremental evaluation is not useful here.
    #[default]
    None,
    /// A new branch has started; the next evaluation saves its base.
    Incremental,
    /// A base is saved; evaluate from it.
    Done,
}

/// Per-search scratch state for one net: the saved input vector and the
/// saved pre-activation hidden sums. Private to a single search; never
/// shared between threads.
#[derive(Default)]
pub struct NetState {
    state: IncrementalState,
    saved_inputs: Vec<f32>,
    saved_base: Vec<f32>,
}

impl NetState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the start of a run of evaluations of sibling positions. The
    /// first evaluation after this call saves its base; the following ones
    /// evaluate incrementally from it.
    pub fn begin_branch(&mut self) {
        self.state = IncrementalState::Incremental;
    }

    /// Disables incremental evaluation until the next branch starts.
    pub fn reset(&mut self) {
        self.state = IncrementalState::None;
    }

    fn next_action(&mut self) -> NetAction {
        match self.state {
            IncrementalState::None => NetAction::Full,
            IncrementalState::Incremental => {
                self.state = IncrementalState::Done;
                NetAction::Save
            }
            IncrementalState::Done => NetAction::FromBase,
        }
    }
}
