/*
 * weights.rs
 * Part of the byte-gammon project
 * Created Date: Monday, March 24th 2025
 * Author: Paul Tsouchlos (DeveloperPaul123) (developer.paul.123@gmail.com)
 * -----
 * Last Modified: Wed Jun 25 2025
 * -----
 * Copyright (c) 2025 Paul Tsouchlos (DeveloperPaul123)
 * GNU General Public License v3.0 or later
 * https://www.gnu.org/licenses/gpl-3.0-standalone.html
 *
 */

use std::fs;
use std::io::Write;
use std::path::Path;

use thiserror::Error;

use crate::inputs::{NUM_CONTACT_INPUTS, NUM_RACE_INPUTS};
use crate::neural_net::{NetError, NeuralNet};

#[derive(Error, Debug)]
pub enum WeightsError {
    #[error("i/o error reading weights: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid weights header")]
    InvalidHeader,
    #[error("truncated weights file")]
    Truncated,
    #[error("malformed weight value")]
    BadValue,
    #[error(transparent)]
    Net(#[from] NetError),
    #[error("{0} net has input width {1}, expected {2}")]
    WrongWidth(&'static str, usize, usize),
}

/// The three learned evaluators, loaded once at init and read-only for the
/// engine's lifetime.
#[derive(Debug)]
pub struct WeightSet {
    pub contact: NeuralNet,
    pub race: NeuralNet,
    pub crashed: NeuralNet,
}

impl WeightSet {
    /// Assembles a weight set, checking every net against the input widths
    /// the encoder produces and the five-output convention.
    pub fn from_nets(
        contact: NeuralNet,
        race: NeuralNet,
        crashed: NeuralNet,
    ) -> Result<WeightSet, WeightsError> {
        check_width("contact", &contact, NUM_CONTACT_INPUTS)?;
        check_width("race", &race, NUM_RACE_INPUTS)?;
        check_width("crashed", &crashed, NUM_CONTACT_INPUTS)?;
        Ok(WeightSet {
            contact,
            race,
            crashed,
        })
    }

    /// Loads the whitespace text format: a version line, then per net a
    /// header `cInput cHidden cOutput trained betaHidden betaOutput` and one
    /// float per line — hidden weights, output weights, hidden thresholds,
    /// output thresholds. Nets are stored contact, race, crashed.
    pub fn load_text(path: &Path) -> Result<WeightSet, WeightsError> {
        let content = fs::read_to_string(path)?;
        let mut lines = content.lines();
        let _version = lines.next().ok_or(WeightsError::Truncated)?;
        let rest = lines.collect::<Vec<_>>().join("\n");
        let mut tokens = rest.split_whitespace();

        let contact = read_net_text(&mut tokens)?;
        let race = read_net_text(&mut tokens)?;
        let crashed = read_net_text(&mut tokens)?;
        WeightSet::from_nets(contact, race, crashed)
    }

    /// Loads the binary format: per net a little-endian header
    /// `{cInput: u32, cHidden: u32, cOutput: u32, trained: u32,
    /// betaHidden: f32, betaOutput: f32}` followed by the four weight blocks
    /// as IEEE-754 floats.
    pub fn load_binary(path: &Path) -> Result<WeightSet, WeightsError> {
        let bytes = fs::read(path)?;
        let mut cursor = Cursor { bytes: &bytes, pos: 0 };
        let contact = read_net_binary(&mut cursor)?;
        let race = read_net_binary(&mut cursor)?;
        let crashed = read_net_binary(&mut cursor)?;
        WeightSet::from_nets(contact, race, crashed)
    }

    /// Writes the binary format produced by [`load_binary`].
    ///
    /// [`load_binary`]: WeightSet::load_binary
    pub fn save_binary(&self, path: &Path) -> Result<(), WeightsError> {
        let mut file = fs::File::create(path)?;
        for net in [&self.contact, &self.race, &self.crashed] {
            write_net_binary(&mut file, net)?;
        }
        Ok(())
    }
}

fn check_width(
    name: &'static str,
    net: &NeuralNet,
    expected: usize,
) -> Result<(), WeightsError> {
    if net.num_inputs() != expected {
        return Err(WeightsError::WrongWidth(name, net.num_inputs(), expected));
    }
    if net.num_outputs() != crate::defs::NUM_OUTPUTS {
        return Err(WeightsError::InvalidHeader);
    }
    Ok(())
}

fn read_net_text<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
) -> Result<NeuralNet, WeightsError> {
    let mut header = [0f64; 6];
    for slot in header.iter_mut() {
        let token = tokens.next().ok_or(WeightsError::Truncated)?;
        *slot = token.parse::<f64>().map_err(|_| WeightsError::InvalidHeader)?;
    }
    let num_inputs = header[0] as usize;
    let num_hidden = header[1] as usize;
    let num_outputs = header[2] as usize;
    let beta_hidden = header[4] as f32;
    let beta_output = header[5] as f32;
    if num_inputs == 0 || num_hidden == 0 || num_outputs == 0 {
        return Err(WeightsError::InvalidHeader);
    }
    if beta_hidden <= 0.0 || beta_output <= 0.0 {
        return Err(WeightsError::InvalidHeader);
    }

    let mut read_block = |count: usize| -> Result<Vec<f32>, WeightsError> {
        let mut block = Vec::with_capacity(count);
        for _ in 0..count {
            let token = tokens.next().ok_or(WeightsError::Truncated)?;
            block.push(token.parse::<f32>().map_err(|_| WeightsError::BadValue)?);
        }
        Ok(block)
    };

    let hidden_weights = read_block(num_inputs * num_hidden)?;
    let output_weights = read_block(num_outputs * num_hidden)?;
    let hidden_thresholds = read_block(num_hidden)?;
    let output_thresholds = read_block(num_outputs)?;

    Ok(NeuralNet::from_parts(
        num_inputs,
        num_hidden,
        num_outputs,
        beta_hidden,
        beta_output,
        hidden_weights,
        output_weights,
        hidden_thresholds,
        output_thresholds,
    )?)
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Cursor<'_> {
    fn read_u32(&mut self) -> Result<u32, WeightsError> {
        let end = self.pos + 4;
        let slice = self.bytes.get(self.pos..end).ok_or(WeightsError::Truncated)?;
        self.pos = end;
        let mut buf = [0u8; 4];
        buf.copy_from_slice(slice);
        Ok(u32::from_le_bytes(buf))
    }

    fn read_f32(&mut self) -> Result<f32, WeightsError> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    fn read_block(&mut self, count: usize) -> Result<Vec<f32>, WeightsError> {
        let mut block = Vec::with_capacity(count);
        for _ in 0..count {
            block.push(self.read_f32()?);
        }
        Ok(block)
    }
}

fn read_net_binary(cursor: &mut Cursor<'_>) -> Result<NeuralNet, WeightsError> {
    let num_inputs = cursor.read_u32()? as usize;
    let num_hidden = cursor.read_u32()? as usize;
    let num_outputs = cursor.read_u32()? as usize;
    let _trained = cursor.read_u32()?;
    let beta_hidden = cursor.read_f32()?;
    let beta_output = cursor.read_f32()?;

    if num_inputs == 0 || num_hidden == 0 || num_outputs == 0 {
        return Err(WeightsError::InvalidHeader);
    }
    if beta_hidden <= 0.0 || beta_output <= 0.0 {
        return Err(WeightsError::InvalidHeader);
    }

    let hidden_weights = cursor.read_block(num_inputs * num_hidden)?;
    let output_weights = cursor.read_block(num_outputs * num_hidden)?;
    let hidden_thresholds = cursor.read_block(num_hidden)?;
    let output_thresholds = cursor.read_block(num_outputs)?;

    Ok(NeuralNet::from_parts(
        num_inputs,
        num_hidden,
        num_outputs,
        beta_hidden,
        beta_output,
        hidden_weights,
        output_weights,
        hidden_thresholds,
        output_thresholds,
    )?)
}

fn write_net_binary(file: &mut fs::File, net: &NeuralNet) -> Result<(), WeightsError> {
    let mut bytes: Vec<u8> = Vec::new();
    bytes.extend((net.num_inputs() as u32).to_le_bytes());
    bytes.extend((net.num_hidden() as u32).to_le_bytes());
    bytes.extend((net.num_outputs() as u32).to_le_bytes());
    bytes.extend(1u32.to_le_bytes());
    bytes.extend(net.beta_hidden().to_le_bytes());
    bytes.extend(net.beta_output().to_le_bytes());
    for block in [
        net.hidden_weights(),
        net.output_weights(),
        net.hidden_thresholds(),
        net.output_thresholds(),
    ] {
        for &w in block {
            bytes.extend(w.to_le_bytes());
        }
    }
    file.write_all(&bytes)?;
    Ok(())
}

/// Small deterministic net used by tests across the crate.
#[cfg(test)]
pub(crate) fn test_net(num_inputs: usize, seed: u32) -> NeuralNet {
    let num_hidden = 2;
    let weight = |i: usize| {
        (((i as u32).wrapping_mul(2654435761).wrapping_add(seed) % 2000) as f32 - 1000.0) / 5000.0
    };
    NeuralNet::from_parts(
        num_inputs,
        num_hidden,
        crate::defs::NUM_OUTPUTS,
        0.1,
        1.0,
        (0..num_inputs * num_hidden).map(weight).collect(),
        (0..crate::defs::NUM_OUTPUTS * num_hidden).map(weight).collect(),
        (0..num_hidden).map(weight).collect(),
        (0..crate::defs::NUM_OUTPUTS).map(weight).collect(),
    )
    .unwrap()
}

/// The default test weight set.
#[cfg(test)]
pub(crate) fn test_weight_set() -> WeightSet {
    WeightSet::from_nets(
        test_net(NUM_CONTACT_INPUTS, 1),
        test_net(NUM_RACE_INPUTS, 2),
        test_net(NUM_CONTACT_INPUTS, 3),
    )
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    use super::test_net as tiny_net;
    use crate::defs::NUM_OUTPUTS;

    fn temp_file(name: &str) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("byte-gammon-test-{}-{}", std::process::id(), name));
        path
    }

    #[test]
    fn binary_round_trip() {
        let set = WeightSet::from_nets(
            tiny_net(NUM_CONTACT_INPUTS, 1),
            tiny_net(NUM_RACE_INPUTS, 2),
            tiny_net(NUM_CONTACT_INPUTS, 3),
        )
        .unwrap();

        let path = temp_file("weights.wd");
        set.save_binary(&path).unwrap();
        let loaded = WeightSet::load_binary(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        let board = gammon::board::Board::starting_position();
        let inputs = crate::inputs::encode(&board, crate::classify::PositionClass::Contact);
        let mut expected = [0.0f32; NUM_OUTPUTS];
        let mut actual = [0.0f32; NUM_OUTPUTS];
        set.contact.evaluate(&inputs, &mut expected);
        loaded.contact.evaluate(&inputs, &mut actual);
        assert_eq!(expected, actual);
    }

    #[test]
    fn text_format_parses() {
        let net = tiny_net(NUM_CONTACT_INPUTS, 7);
        let mut text = String::from("byte-gammon weights 1.0\n");
        for source in [&net, &tiny_net(NUM_RACE_INPUTS, 8), &tiny_net(NUM_CONTACT_INPUTS, 9)] {
            text.push_str(&format!(
                "{} {} {} 1 {} {}\n",
                source.num_inputs(),
                source.num_hidden(),
                source.num_outputs(),
                source.beta_hidden(),
                source.beta_output()
            ));
            for block in [
                source.hidden_weights(),
                source.output_weights(),
                source.hidden_thresholds(),
                source.output_thresholds(),
            ] {
                for w in block {
                    text.push_str(&format!("{}\n", w));
                }
            }
        }

        let path = temp_file("weights.txt");
        std::fs::write(&path, text).unwrap();
        let loaded = WeightSet::load_text(&path);
        let _ = std::fs::remove_file(&path);
        assert!(loaded.is_ok());
    }

    #[test]
    fn rejects_bad_header() {
        let path = temp_file("bad.txt");
        std::fs::write(&path, "version\n0 2 5 1 0.1 1.0\n").unwrap();
        let result = WeightSet::load_text(&path);
        let _ = std::fs::remove_file(&path);
        assert!(matches!(result, Err(WeightsError::InvalidHeader)));
    }

    #[test]
    fn rejects_wrong_width() {
        let result = WeightSet::from_nets(
            tiny_net(10, 1),
            tiny_net(NUM_RACE_INPUTS, 2),
            tiny_net(NUM_CONTACT_INPUTS, 3),
        );
        assert!(matches!(result, Err(WeightsError::WrongWidth("contact", 10, _))));
    }
}
