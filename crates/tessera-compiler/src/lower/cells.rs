//! Data cell naming and the data section.
//!
//! Every storage location the code addresses is a named data cell. Tuple
//! values have no runtime type of their own and are flattened into one cell
//! per component, suffixed with the component index.
//!
//! | storage                 | cell name                        |
//! |-------------------------|----------------------------------|
//! | module variable         | `name`                           |
//! | local variable          | `__l{index}_{name}`              |
//! | temporary slot          | `__{temp root}_{real}_{slot}`    |
//! | literal                 | `__lit_{index}`                  |
//! | function value          | `__fn_{index}`                   |
//! | function return address | `__fn_{index}_ra`                |
//! | calling convention      | `__sig{n}_arg{i}`, `__sig{n}_ret`, `__sig{n}_ra` |
//! | call return point       | `__ret_{k}`                      |

use rustc_hash::FxHashMap;

use tessera_core::{FunctionSig, InternalError, QualifierId, TypeId, TypeTable};

use crate::asm::{CellAttrs, DataDecl, DataInit, HALT_ADDRESS};
use crate::entities::{FuncId, LiteralId, Var};
use crate::pool::OutValue;
use crate::session::Session;

type Result<T> = std::result::Result<T, InternalError>;

/// Cell holding the halting code offset.
pub(super) const HALT: &str = "__halt";
/// Cell holding the receiver.
pub(super) const THIS: &str = "__this";

const ADDRESS: &str = "SystemUInt32";
const OBJECT: &str = "SystemObject";

pub(super) fn literal(id: LiteralId) -> String {
    format!("__lit_{}", id.0)
}

pub(super) fn func(id: FuncId) -> String {
    format!("__fn_{}", id.0)
}

pub(super) fn func_entry(id: FuncId) -> String {
    format!("__fn_{}_entry", id.0)
}

pub(super) fn func_body(id: FuncId) -> String {
    format!("__fn_{}_body", id.0)
}

pub(super) fn func_ra(id: FuncId) -> String {
    format!("__fn_{}_ra", id.0)
}

/// The name of a temporary slot.
pub(super) fn temp(session: &Session, value: OutValue) -> Result<String> {
    let real = real(&session.types, value.ty)?;
    let root = session.qualifiers.render(value.root).replace('.', "_");
    Ok(format!("__{root}_{real}_{}", value.slot))
}

/// The base name of a variable's cells.
pub(super) fn var_base(var: &Var, module: QualifierId) -> String {
    if var.qualifier == module {
        var.name.clone()
    } else {
        format!("__l{}_{}", var.index.0, var.name)
    }
}

/// The runtime type name behind `ty`.
pub(super) fn real(types: &TypeTable, ty: TypeId) -> Result<&str> {
    types.real_name(ty).ok_or_else(|| {
        InternalError::malformed(format!("type '{}' has no runtime representation", types.display(ty)))
    })
}

/// The cells storing a value of `ty` under `base`, with their types.
///
/// Tuples expand to `{base}_{i}` per component, recursively. Types without
/// run-time values take no cells.
pub(super) fn flatten(types: &TypeTable, base: &str, ty: TypeId) -> Vec<(String, TypeId)> {
    let mut out = Vec::new();
    flatten_into(types, base.to_string(), ty, &mut out);
    out
}

fn flatten_into(types: &TypeTable, base: String, ty: TypeId, out: &mut Vec<(String, TypeId)>) {
    if let Some(elems) = types.tuple_elems(ty) {
        for (i, &elem) in elems.iter().enumerate() {
            flatten_into(types, format!("{base}_{i}"), elem, out);
        }
    } else if types.is_value_type(ty) && !types.contains_unknown(ty) {
        out.push((base, ty));
    }
}

// ============================================================================
// Calling convention
// ============================================================================

/// Argument, result and return-address cells shared by every function of
/// one signature.
#[derive(Debug, Default)]
pub(super) struct SignatureCells {
    index: FxHashMap<TypeId, usize>,
    order: Vec<TypeId>,
}

impl SignatureCells {
    fn number(&mut self, signature: TypeId) -> usize {
        let next = self.order.len();
        *self.index.entry(signature).or_insert_with(|| {
            self.order.push(signature);
            next
        })
    }

    pub(super) fn args(&mut self, types: &TypeTable, signature: TypeId) -> Result<Vec<String>> {
        let n = self.number(signature);
        let sig = function_sig(types, signature)?;
        Ok(sig
            .params
            .iter()
            .enumerate()
            .flat_map(|(i, &p)| flatten(types, &format!("__sig{n}_arg{i}"), p))
            .map(|(name, _)| name)
            .collect())
    }

    pub(super) fn ret(&mut self, types: &TypeTable, signature: TypeId) -> Result<Vec<String>> {
        let n = self.number(signature);
        let sig = function_sig(types, signature)?;
        Ok(flatten(types, &format!("__sig{n}_ret"), sig.ret)
            .into_iter()
            .map(|(name, _)| name)
            .collect())
    }

    pub(super) fn ra(&mut self, signature: TypeId) -> String {
        format!("__sig{}_ra", self.number(signature))
    }

    fn decls(&self, types: &TypeTable) -> Result<Vec<DataDecl>> {
        let mut out = Vec::new();
        for (n, &signature) in self.order.iter().enumerate() {
            let sig = function_sig(types, signature)?;
            for (i, &param) in sig.params.iter().enumerate() {
                for (name, ty) in flatten(types, &format!("__sig{n}_arg{i}"), param) {
                    out.push(DataDecl::new(name, real(types, ty)?, DataInit::Null));
                }
            }
            for (name, ty) in flatten(types, &format!("__sig{n}_ret"), sig.ret) {
                out.push(DataDecl::new(name, real(types, ty)?, DataInit::Null));
            }
            out.push(DataDecl::new(format!("__sig{n}_ra"), ADDRESS, DataInit::Null));
        }
        Ok(out)
    }
}

fn function_sig(types: &TypeTable, signature: TypeId) -> Result<FunctionSig> {
    types.function_sig(signature).ok_or_else(|| {
        InternalError::malformed(format!("'{}' is not a function type", types.display(signature)))
    })
}

// ============================================================================
// Data section
// ============================================================================

/// Declare every cell the code may address, in section order: variables,
/// temporaries, literals, function values, calling-convention cells, return
/// points, then the fixed cells. The linker drops the unused ones.
pub(super) fn data_section(
    session: &Session,
    module: QualifierId,
    signatures: &SignatureCells,
    returns: &[(String, String)],
) -> Result<Vec<DataDecl>> {
    let types = &session.types;
    let mut data = Vec::new();

    for var in session.vars.iter() {
        let init = match (var.default, session.funcs.bound_to(var.index)) {
            (Some(id), _) => DataInit::Literal(session.literals.get(id)?.value.to_string()),
            (None, Some(func)) => DataInit::Indirect(func_entry(func)),
            (None, None) => DataInit::Null,
        };
        let attrs = CellAttrs {
            export: var.is_exported(),
            sync: var.sync,
        };
        for (name, ty) in flatten(types, &var_base(var, module), var.ty) {
            data.push(DataDecl {
                name,
                real: real(types, ty)?.to_string(),
                init: init.clone(),
                attrs,
                declared: var.is_exported().then(|| types.display(ty)),
            });
        }
    }

    for (root, ty, count) in session.pool.high_water() {
        if types.real_name(ty).is_none() {
            continue;
        }
        for slot in 0..count {
            let name = temp(session, OutValue { root, ty, slot })?;
            data.push(DataDecl::new(name, real(types, ty)?, DataInit::Null));
        }
    }

    for lit in session.literals.iter() {
        let backing = types.real_name(lit.ty).unwrap_or(OBJECT);
        data.push(DataDecl::new(
            literal(lit.index),
            backing,
            DataInit::Literal(lit.value.to_string()),
        ));
    }

    for f in session.funcs.iter() {
        data.push(DataDecl::new(func(f.index), ADDRESS, DataInit::Indirect(func_entry(f.index))));
        data.push(DataDecl::new(func_ra(f.index), ADDRESS, DataInit::Null));
    }

    data.extend(signatures.decls(types)?);

    for (cell, label) in returns {
        data.push(DataDecl::new(cell.clone(), ADDRESS, DataInit::Indirect(label.clone())));
    }

    data.push(DataDecl::new(HALT, ADDRESS, DataInit::Address(HALT_ADDRESS)));
    data.push(DataDecl::new(THIS, OBJECT, DataInit::This));
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tuples_flatten_per_component() {
        let mut types = TypeTable::new();
        let inner = types.tuple_of(&[TypeTable::BOOL, TypeTable::STRING]);
        let outer = types.tuple_of(&[TypeTable::INT, inner]);

        let names: Vec<String> = flatten(&types, "pair", outer).into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["pair_0", "pair_1_0", "pair_1_1"]);
        assert!(flatten(&types, "v", TypeTable::VOID).is_empty());
        assert_eq!(flatten(&types, "x", TypeTable::FLOAT), vec![("x".to_string(), TypeTable::FLOAT)]);
    }

    #[test]
    fn signatures_are_numbered_on_first_use() {
        let mut types = TypeTable::new();
        let unary = types.function(&[TypeTable::INT], TypeTable::INT, false);
        let nullary = types.function(&[], TypeTable::VOID, false);
        let mut sigs = SignatureCells::default();

        assert_eq!(sigs.ra(nullary), "__sig0_ra");
        assert_eq!(sigs.args(&types, unary).unwrap(), vec!["__sig1_arg0"]);
        assert_eq!(sigs.ret(&types, unary).unwrap(), vec!["__sig1_ret"]);
        assert!(sigs.ret(&types, nullary).unwrap().is_empty());
        assert_eq!(sigs.ra(unary), "__sig1_ra");

        let names: Vec<String> = sigs.decls(&types).unwrap().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["__sig0_ra", "__sig1_arg0", "__sig1_ret", "__sig1_ra"]);
    }

    #[test]
    fn non_function_signature_is_malformed() {
        let types = TypeTable::new();
        let mut sigs = SignatureCells::default();
        assert!(matches!(
            sigs.args(&types, TypeTable::INT),
            Err(InternalError::Malformed { .. })
        ));
    }
}
