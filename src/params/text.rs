//! Line-oriented parameter files.
//!
//! One line per weight or bias group, values separated by spaces, groups in
//! plan order: `conv1` weights, `conv1` bias, `conv3` weights, ... There is
//! no header; group sizes come from the architecture.

use std::fmt::Write as _;
use std::path::Path;

use tracing::info;

use super::store::{io_error, parse_token, LayerParams, Parameters};
use crate::error::ParamError;
use crate::network::spec::Plan;

/// Parses a whole parameter file. Every group line must hold exactly the
/// number of values the architecture declares for it.
pub fn parse(plan: &Plan, text: &str) -> Result<Parameters, ParamError> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let mut token_index = 0;
    let mut layers = Vec::new();

    let mut group = 0;
    let mut read_group = |name: String, expected: usize| -> Result<Vec<f32>, ParamError> {
        let line = lines.next().ok_or_else(|| ParamError::MissingGroup { group, name: name.clone() })?;
        let values = line
            .split_whitespace()
            .map(|token| {
                token_index += 1;
                parse_token(token_index - 1, token)
            })
            .collect::<Result<Vec<f32>, ParamError>>()?;
        if values.len() != expected {
            return Err(ParamError::GroupLength { group, name, expected, found: values.len() });
        }
        group += 1;
        Ok(values)
    };

    for (stage, shape) in plan.param_stages() {
        let weights = read_group(format!("{}-weights", stage.name()), shape.weight_len())?;
        let bias = read_group(format!("{}-bias", stage.name()), shape.bias_len())?;
        layers.push(LayerParams { shape, weights, bias });
    }

    let extra = lines.count();
    if extra > 0 {
        return Err(ParamError::TrailingGroups { extra });
    }
    Parameters::from_layers(plan, layers)
}

pub fn read_file(plan: &Plan, path: impl AsRef<Path>) -> Result<Parameters, ParamError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| io_error(path, source))?;
    let params = parse(plan, &text)?;
    info!(path = %path.display(), values = params.element_count(), "read parameter file");
    Ok(params)
}

/// Renders parameters in the format [`parse`] reads. Values use the
/// shortest representation that round-trips to the same `f32`.
pub fn write(params: &Parameters) -> String {
    let mut out = String::new();
    for layer in params.layers() {
        for group in [&layer.weights, &layer.bias] {
            for (i, v) in group.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                let _ = write!(out, "{v}");
            }
            out.push('\n');
        }
    }
    out
}

pub fn write_file(params: &Parameters, path: impl AsRef<Path>) -> Result<(), ParamError> {
    let path = path.as_ref();
    std::fs::write(path, write(params)).map_err(|source| io_error(path, source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::spec::{ArchitectureSpec, InputSpec, LayerSpec};
    use crate::activation::Activation;

    fn tiny_plan() -> Plan {
        ArchitectureSpec {
            name: "tiny".into(),
            input: InputSpec { channels: 1, height: 2, width: 2, padding: 0 },
            layers: vec![
                LayerSpec::Conv { out_channels: 2, kernel: 1, stride: 1, padding: 0 },
                LayerSpec::MaxPoolFlatten { kernel: 2, stride: 2, padding: 0 },
                LayerSpec::Dense { out_features: 3, activation: Activation::Identity },
            ],
        }
        .plan()
        .unwrap()
    }

    #[test]
    fn parses_groups_in_order() {
        let text = "0.5 -1.25\n3 4\n1 2 3 4 5 6\n-0.1 0.2 0.3\n";
        let params = parse(&tiny_plan(), text).unwrap();
        let conv = params.layer(0).unwrap();
        assert_eq!(conv.weights, vec![0.5, -1.25]);
        assert_eq!(conv.bias, vec![3.0, 4.0]);
        let fc = params.layer(1).unwrap();
        assert_eq!(fc.dense_weight(2, 1), Some(6.0));
        assert_eq!(fc.bias, vec![-0.1, 0.2, 0.3]);
    }

    #[test]
    fn short_group_names_the_layer() {
        let text = "0.5 -1.25\n3 4\n1 2 3 4 5\n-0.1 0.2 0.3\n";
        match parse(&tiny_plan(), text) {
            Err(ParamError::GroupLength { group, name, expected, found }) => {
                assert_eq!((group, name.as_str(), expected, found), (2, "fc3-weights", 6, 5));
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn missing_and_extra_lines() {
        assert!(matches!(
            parse(&tiny_plan(), "0.5 -1.25\n3 4\n"),
            Err(ParamError::MissingGroup { group: 2, .. })
        ));
        assert!(matches!(
            parse(&tiny_plan(), "1 1\n0 0\n1 2 3 4 5 6\n0 0 0\n7\n\n"),
            Err(ParamError::TrailingGroups { extra: 1 })
        ));
    }

    #[test]
    fn rejects_non_numeric_tokens() {
        assert!(matches!(
            parse(&tiny_plan(), "1 one\n0 0\n1 2 3 4 5 6\n0 0 0\n"),
            Err(ParamError::InvalidToken { index: 1, .. })
        ));
    }

    #[test]
    fn written_file_reads_back_identically() {
        let plan = tiny_plan();
        let params = parse(&plan, "0.1 0.2\n0.3 1e-7\n1 2 3 4 5 6\n-0.1 0.2 0.3\n").unwrap();
        let path = std::env::temp_dir().join(format!("monkey-cnn-params-{}.txt", std::process::id()));
        write_file(&params, &path).unwrap();
        let back = read_file(&plan, &path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(back, params);
    }
}
