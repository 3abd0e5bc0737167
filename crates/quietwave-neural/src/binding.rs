//! Input/output slot resolution
//!
//! Exported denoisers do not agree on tensor names. The session picks the
//! conventional name when the model declares one and otherwise falls back to
//! the first declared slot, so the same model always binds the same way.

use serde::Serialize;

use crate::DenoiseError;

/// Conventional input slot names, in precedence order.
pub const INPUT_PREFERENCE: &[&str] = &["input", "inputs", "model_input", "input_0"];

/// Conventional output slot names, in precedence order.
pub const OUTPUT_PREFERENCE: &[&str] = &["output", "outputs", "model_output", "output_0"];

/// Slot names bound once at session open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TensorBinding {
    input: String,
    output: String,
}

impl TensorBinding {
    #[inline]
    pub fn input(&self) -> &str {
        &self.input
    }

    #[inline]
    pub fn output(&self) -> &str {
        &self.output
    }
}

/// Resolve the input and output slot to bind.
///
/// Each side is resolved independently: the first preference-list entry that
/// matches a declared name (ASCII case-insensitive) wins, else the first
/// declared slot. The declared spelling is what gets bound.
pub fn resolve_bindings<I, O>(inputs: &[I], outputs: &[O]) -> Result<TensorBinding, DenoiseError>
where
    I: AsRef<str>,
    O: AsRef<str>,
{
    let (Some(input), Some(output)) = (
        pick_slot(INPUT_PREFERENCE, inputs),
        pick_slot(OUTPUT_PREFERENCE, outputs),
    ) else {
        return Err(DenoiseError::IoTopology {
            inputs: inputs.iter().map(|s| s.as_ref().to_string()).collect(),
            outputs: outputs.iter().map(|s| s.as_ref().to_string()).collect(),
        });
    };

    Ok(TensorBinding {
        input: input.to_string(),
        output: output.to_string(),
    })
}

fn pick_slot<'a, S: AsRef<str>>(preference: &[&str], declared: &'a [S]) -> Option<&'a str> {
    preference
        .iter()
        .find_map(|wanted| {
            declared
                .iter()
                .map(AsRef::as_ref)
                .find(|name| name.eq_ignore_ascii_case(wanted))
        })
        .or_else(|| declared.first().map(AsRef::as_ref))
}
