//! Function registry.
//!
//! Collects the descriptors extracted from one translation unit and pairs the
//! 32-bit and 64-bit variants of each routine under their dispatch name.
//! Dispatch names iterate in first-appearance order so generated output is
//! deterministic.

use std::collections::HashMap;

use thiserror::Error;

use super::ctype::{map_return, map_type, CType};
use super::function::{FunctionDescriptor, Precision, Shape};
use super::language::TargetLanguage;

/// Integrity errors surfaced by the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("duplicate {precision} routine for `{dispatch_name}`: `{existing}` and `{duplicate}`")]
    DuplicateSymbol {
        dispatch_name: String,
        precision: Precision,
        existing: String,
        duplicate: String,
    },

    #[error("`{dispatch_name}` has no {missing} variant (found only `{present}`)")]
    MissingPairing {
        dispatch_name: String,
        missing: Precision,
        present: String,
    },

    #[error("`{0}` is not in the registry")]
    UnknownDispatchName(String),

    #[error(
        "`{single}` and `{double}` take different parameter counts ({single_count} vs {double_count})"
    )]
    ArityMismatch {
        single: String,
        double: String,
        single_count: usize,
        double_count: usize,
    },

    #[error(
        "parameter {index} of `{single}` is {single_shape:?} but {double_shape:?} in `{double}`"
    )]
    ShapeMismatch {
        single: String,
        double: String,
        index: usize,
        single_shape: Shape,
        double_shape: Shape,
    },

    #[error(
        "parameter {index} of `{single}` is `{single_type}` but `{double_type}` in `{double}`"
    )]
    TypeMismatch {
        single: String,
        double: String,
        index: usize,
        single_type: String,
        double_type: String,
    },

    #[error("`{single}` returns `{single_type}` but `{double}` returns `{double_type}`")]
    ReturnMismatch {
        single: String,
        double: String,
        single_type: String,
        double_type: String,
    },
}

/// Slot holding at most one descriptor per precision.
#[derive(Debug, Clone, Default)]
pub struct PairSlot {
    pub single: Option<FunctionDescriptor>,
    pub double: Option<FunctionDescriptor>,
}

impl PairSlot {
    pub fn get(&self, precision: Precision) -> Option<&FunctionDescriptor> {
        match precision {
            Precision::Single => self.single.as_ref(),
            Precision::Double => self.double.as_ref(),
        }
    }

    fn get_mut(&mut self, precision: Precision) -> &mut Option<FunctionDescriptor> {
        match precision {
            Precision::Single => &mut self.single,
            Precision::Double => &mut self.double,
        }
    }

    /// Whether both precisions are present.
    pub fn is_complete(&self) -> bool {
        self.single.is_some() && self.double.is_some()
    }
}

/// Both variants of one dispatch name.
#[derive(Debug, Clone, Copy)]
pub struct FunctionPair<'a> {
    pub dispatch_name: &'a str,
    pub single: &'a FunctionDescriptor,
    pub double: &'a FunctionDescriptor,
}

impl<'a> FunctionPair<'a> {
    pub fn get(&self, precision: Precision) -> &'a FunctionDescriptor {
        match precision {
            Precision::Single => self.single,
            Precision::Double => self.double,
        }
    }

    /// Check arity, positional pointer/array agreement, and that both
    /// variants erase to the same generic-precision signature (including
    /// pointer mutability).
    pub fn check_shapes(&self) -> Result<(), RegistryError> {
        let (s, d) = (&self.single.parameters, &self.double.parameters);

        if s.len() != d.len() {
            return Err(RegistryError::ArityMismatch {
                single: self.single.raw_name.clone(),
                double: self.double.raw_name.clone(),
                single_count: s.len(),
                double_count: d.len(),
            });
        }

        for (index, (sp, dp)) in s.iter().zip(d).enumerate() {
            if sp.shape() != dp.shape() {
                return Err(RegistryError::ShapeMismatch {
                    single: self.single.raw_name.clone(),
                    double: self.double.raw_name.clone(),
                    index,
                    single_shape: sp.shape(),
                    double_shape: dp.shape(),
                });
            }
            if generic_type(&sp.c_type) != generic_type(&dp.c_type) {
                return Err(RegistryError::TypeMismatch {
                    single: self.single.raw_name.clone(),
                    double: self.double.raw_name.clone(),
                    index,
                    single_type: sp.c_type.clone(),
                    double_type: dp.c_type.clone(),
                });
            }
        }

        let generic_return = |t: &str| map_return(t, TargetLanguage::Rust).map(|m| m.rendered);
        if generic_return(&self.single.return_type) != generic_return(&self.double.return_type) {
            return Err(RegistryError::ReturnMismatch {
                single: self.single.raw_name.clone(),
                double: self.double.raw_name.clone(),
                single_type: self.single.return_type.clone(),
                double_type: self.double.return_type.clone(),
            });
        }

        Ok(())
    }
}

/// A parameter type with its precision erased; `None` for spellings the type
/// table does not model, such as function pointers.
fn generic_type(c_type: &str) -> Option<String> {
    match CType::classify(c_type) {
        CType::Unsupported(_) => None,
        _ => Some(map_type(c_type, TargetLanguage::Rust).rendered),
    }
}

/// Registry of extracted routines keyed by dispatch name.
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    slots: Vec<(String, PairSlot)>,
    index: HashMap<String, usize>,
}

impl FunctionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a descriptor into the slot for its dispatch name.
    ///
    /// Re-adding a byte-identical descriptor is a no-op (headers commonly
    /// repeat prototypes). A different descriptor for an occupied precision
    /// is a [`RegistryError::DuplicateSymbol`].
    pub fn add(&mut self, descriptor: FunctionDescriptor) -> Result<(), RegistryError> {
        let idx = match self.index.get(&descriptor.dispatch_name) {
            Some(&idx) => idx,
            None => {
                let idx = self.slots.len();
                self.index.insert(descriptor.dispatch_name.clone(), idx);
                self.slots
                    .push((descriptor.dispatch_name.clone(), PairSlot::default()));
                idx
            }
        };

        let slot = self.slots[idx].1.get_mut(descriptor.precision);
        match slot.as_ref() {
            Some(existing) if *existing == descriptor => {
                tracing::debug!("ignoring identical redeclaration of `{}`", descriptor.raw_name);
                Ok(())
            }
            Some(existing) => Err(RegistryError::DuplicateSymbol {
                dispatch_name: descriptor.dispatch_name.clone(),
                precision: descriptor.precision,
                existing: existing.raw_name.clone(),
                duplicate: descriptor.raw_name,
            }),
            None => {
                *slot = Some(descriptor);
                Ok(())
            }
        }
    }

    /// Dispatch names in first-appearance order.
    pub fn dispatch_names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|(name, _)| name.as_str())
    }

    /// The slot for a dispatch name, complete or not.
    pub fn slot(&self, dispatch_name: &str) -> Option<&PairSlot> {
        self.index
            .get(dispatch_name)
            .map(|&idx| &self.slots[idx].1)
    }

    /// Both variants of a dispatch name, or a missing-pairing error.
    pub fn pair_for(&self, dispatch_name: &str) -> Result<FunctionPair<'_>, RegistryError> {
        let (name, slot) = self
            .index
            .get(dispatch_name)
            .map(|&idx| &self.slots[idx])
            .ok_or_else(|| RegistryError::UnknownDispatchName(dispatch_name.to_string()))?;

        match (&slot.single, &slot.double) {
            (Some(single), Some(double)) => Ok(FunctionPair {
                dispatch_name: name,
                single,
                double,
            }),
            (Some(present), None) => Err(RegistryError::MissingPairing {
                dispatch_name: name.clone(),
                missing: Precision::Double,
                present: present.raw_name.clone(),
            }),
            (None, Some(present)) => Err(RegistryError::MissingPairing {
                dispatch_name: name.clone(),
                missing: Precision::Single,
                present: present.raw_name.clone(),
            }),
            // Slots are only created by `add`, which always fills one half.
            (None, None) => Err(RegistryError::UnknownDispatchName(name.clone())),
        }
    }

    /// All pairs in dispatch order, failing on the first gap.
    pub fn pairs(&self) -> Result<Vec<FunctionPair<'_>>, RegistryError> {
        self.dispatch_names().map(|name| self.pair_for(name)).collect()
    }

    /// Descriptors of one precision, in dispatch order.
    pub fn functions(&self, precision: Precision) -> impl Iterator<Item = &FunctionDescriptor> {
        self.slots
            .iter()
            .filter_map(move |(_, slot)| slot.get(precision))
    }

    /// Check that every dispatch name is paired with compatible shapes.
    pub fn validate(&self) -> Result<(), RegistryError> {
        for pair in self.pairs()? {
            pair.check_shapes()?;
        }
        Ok(())
    }

    /// Number of dispatch names.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::function::Parameter;

    fn gemm(precision: Precision) -> FunctionDescriptor {
        let (raw, t) = match precision {
            Precision::Single => ("cblas_sgemm", "float"),
            Precision::Double => ("cblas_dgemm", "double"),
        };
        FunctionDescriptor {
            raw_name: raw.to_string(),
            dispatch_name: "cblas_gemm".to_string(),
            precision,
            return_type: "void".to_string(),
            parameters: vec![
                Parameter::new("a", format!("const {t} *")),
                Parameter::new("b", format!("const {t} *")),
                Parameter::new("c", format!("{t} *")),
                Parameter::new("work", format!("{t}[]")),
            ],
        }
    }

    fn named(dispatch: &str, raw: &str, precision: Precision) -> FunctionDescriptor {
        FunctionDescriptor {
            raw_name: raw.to_string(),
            dispatch_name: dispatch.to_string(),
            precision,
            return_type: "void".to_string(),
            parameters: vec![],
        }
    }

    #[test]
    fn test_pairs_variants() {
        let mut reg = FunctionRegistry::new();
        reg.add(gemm(Precision::Double)).unwrap();
        reg.add(gemm(Precision::Single)).unwrap();

        assert_eq!(reg.len(), 1);
        let pair = reg.pair_for("cblas_gemm").unwrap();
        assert_eq!(pair.single.raw_name, "cblas_sgemm");
        assert_eq!(pair.double.raw_name, "cblas_dgemm");
        assert_eq!(pair.single.parameters.len(), 4);
        reg.validate().unwrap();
    }

    #[test]
    fn test_insertion_order() {
        let mut reg = FunctionRegistry::new();
        for (dispatch, raw, p) in [
            ("zeta", "szeta", Precision::Single),
            ("alpha", "dalpha", Precision::Double),
            ("zeta", "dzeta", Precision::Double),
            ("mid", "smid", Precision::Single),
            ("alpha", "salpha", Precision::Single),
        ] {
            reg.add(named(dispatch, raw, p)).unwrap();
        }

        assert_eq!(reg.dispatch_names().collect::<Vec<_>>(), vec!["zeta", "alpha", "mid"]);
        assert_eq!(
            reg.functions(Precision::Single)
                .map(|f| f.raw_name.as_str())
                .collect::<Vec<_>>(),
            vec!["szeta", "salpha", "smid"]
        );
        assert_eq!(
            reg.functions(Precision::Double)
                .map(|f| f.raw_name.as_str())
                .collect::<Vec<_>>(),
            vec!["dzeta", "dalpha"]
        );
    }

    #[test]
    fn test_identical_redeclaration_is_noop() {
        let mut reg = FunctionRegistry::new();
        reg.add(gemm(Precision::Single)).unwrap();
        reg.add(gemm(Precision::Single)).unwrap();
        assert_eq!(reg.functions(Precision::Single).count(), 1);
    }

    #[test]
    fn test_conflicting_duplicate_is_error() {
        let mut reg = FunctionRegistry::new();
        reg.add(gemm(Precision::Single)).unwrap();

        let mut other = gemm(Precision::Single);
        other.parameters.pop();
        let err = reg.add(other).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::DuplicateSymbol {
                precision: Precision::Single,
                ..
            }
        ));

        // The first descriptor is kept.
        assert_eq!(
            reg.slot("cblas_gemm").unwrap().single.as_ref().unwrap().parameters.len(),
            4
        );
    }

    #[test]
    fn test_missing_pairing() {
        let mut reg = FunctionRegistry::new();
        reg.add(gemm(Precision::Single)).unwrap();

        let err = reg.pair_for("cblas_gemm").unwrap_err();
        assert!(matches!(
            err,
            RegistryError::MissingPairing {
                missing: Precision::Double,
                ..
            }
        ));
        assert!(reg.validate().is_err());
        assert!(reg.pairs().is_err());
    }

    #[test]
    fn test_unknown_dispatch_name() {
        let reg = FunctionRegistry::new();
        assert!(matches!(
            reg.pair_for("cblas_gemm"),
            Err(RegistryError::UnknownDispatchName(_))
        ));
    }

    #[test]
    fn test_shape_mismatch() {
        let mut reg = FunctionRegistry::new();
        reg.add(gemm(Precision::Single)).unwrap();

        let mut double = gemm(Precision::Double);
        double.parameters[3] = Parameter::new("work", "double *");
        reg.add(double).unwrap();

        let err = reg.validate().unwrap_err();
        assert!(matches!(
            err,
            RegistryError::ShapeMismatch {
                index: 3,
                single_shape: Shape::Array,
                double_shape: Shape::Pointer,
                ..
            }
        ));
    }

    #[test]
    fn test_pointer_mutability_mismatch() {
        let mut reg = FunctionRegistry::new();
        reg.add(gemm(Precision::Single)).unwrap();

        let mut double = gemm(Precision::Double);
        double.parameters[0] = Parameter::new("a", "double *");
        reg.add(double).unwrap();

        let err = reg.validate().unwrap_err();
        assert!(matches!(err, RegistryError::TypeMismatch { index: 0, .. }), "{err}");
        assert_eq!(
            err.to_string(),
            "parameter 0 of `cblas_sgemm` is `const float *` but `double *` in `cblas_dgemm`"
        );
    }

    #[test]
    fn test_integer_width_mismatch() {
        let mut reg = FunctionRegistry::new();
        let mut single = gemm(Precision::Single);
        single.parameters.push(Parameter::new("n", "int"));
        let mut double = gemm(Precision::Double);
        double.parameters.push(Parameter::new("n", "long long"));
        reg.add(single).unwrap();
        reg.add(double).unwrap();

        assert!(matches!(
            reg.validate().unwrap_err(),
            RegistryError::TypeMismatch { index: 4, .. }
        ));
    }

    #[test]
    fn test_return_mismatch() {
        let mut reg = FunctionRegistry::new();
        let mut single = gemm(Precision::Single);
        single.return_type = "float".to_string();
        reg.add(single).unwrap();
        reg.add(gemm(Precision::Double)).unwrap();

        assert!(matches!(
            reg.validate().unwrap_err(),
            RegistryError::ReturnMismatch { .. }
        ));
    }

    #[test]
    fn test_arity_mismatch() {
        let mut reg = FunctionRegistry::new();
        reg.add(gemm(Precision::Single)).unwrap();

        let mut double = gemm(Precision::Double);
        double.parameters.truncate(2);
        reg.add(double).unwrap();

        assert!(matches!(
            reg.validate(),
            Err(RegistryError::ArityMismatch {
                single_count: 4,
                double_count: 2,
                ..
            })
        ));
    }
}
