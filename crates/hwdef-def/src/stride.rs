//! Array pattern inference.
//!
//! Given an array's `(index, address)` pairs, derive a closed form
//! `address = base + step * index` so renderers can emit one macro instead
//! of an element list. Pure analysis; never mutates the model and never
//! hard-fails — an array without a closed form is simply `Irregular`.

use serde::Serialize;

/// The closed-form addressing pattern of an array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Pattern {
    /// No closed form exists (empty, inconsistent stride, zero or
    /// non-integer stride). Renderers annotate rather than fail.
    Irregular,
    /// Exactly one element: a degenerate base with no stride. Never
    /// rendered as a shift form.
    Single { base: u64 },
    /// `address = base + step * index` holds for every element. `shift`
    /// is populated only when `step` is an exact power of two.
    Strided {
        base: u64,
        step: u64,
        shift: Option<u32>,
    },
}

impl Pattern {
    /// Infer the pattern from `(index, address)` pairs sorted by address.
    pub fn infer(elements: &[(u64, u64)]) -> Pattern {
        match elements {
            [] => Pattern::Irregular,
            [(_, addr)] => Pattern::Single { base: *addr },
            [(index0, addr0), (index1, addr1), ..] => {
                let di = *index1 as i128 - *index0 as i128;
                let da = *addr1 as i128 - *addr0 as i128;
                if di == 0 || da % di != 0 {
                    return Pattern::Irregular;
                }
                let step = da / di;
                if step <= 0 {
                    return Pattern::Irregular;
                }

                let base = *addr0 as i128 - step * *index0 as i128;
                if base < 0 {
                    return Pattern::Irregular;
                }
                let consistent = elements
                    .iter()
                    .all(|&(index, addr)| addr as i128 == base + step * index as i128);
                if !consistent {
                    return Pattern::Irregular;
                }

                let step = step as u64;
                let shift = if step.is_power_of_two() {
                    Some(step.trailing_zeros())
                } else {
                    None
                };
                Pattern::Strided {
                    base: base as u64,
                    step,
                    shift,
                }
            }
        }
    }
}
