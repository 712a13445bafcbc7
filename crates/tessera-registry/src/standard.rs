//! The built-in host catalog.

use tracing::debug;

use tessera_core::{TypeId, TypeTable};

use crate::{CatalogBuilder, MethodCatalog, RegistrationError};

/// Operators on the primitives, arrays of primitives, and the `Debug`,
/// `Random`, `Mathf` and `Convert` namespaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardCatalog;

const ARITHMETIC: [&str; 5] = [
    "op_Addition",
    "op_Subtraction",
    "op_Multiplication",
    "op_Division",
    "op_Remainder",
];

const COMPARISON: [&str; 6] = [
    "op_Equality",
    "op_Inequality",
    "op_LessThan",
    "op_LessThanOrEqual",
    "op_GreaterThan",
    "op_GreaterThanOrEqual",
];

const LOGICAL: [&str; 3] = ["op_LogicalAnd", "op_LogicalOr", "op_LogicalXor"];

impl MethodCatalog for StandardCatalog {
    fn register(&self, b: &mut CatalogBuilder<'_>) -> Result<(), RegistrationError> {
        let int = TypeTable::INT;
        let float = TypeTable::FLOAT;
        let bool_ = TypeTable::BOOL;
        let string = TypeTable::STRING;
        let object = TypeTable::OBJECT;

        for ty in [int, float] {
            for op in ARITHMETIC {
                binary(b, ty, op, ty)?;
            }
            for op in COMPARISON {
                binary(b, ty, op, bool_)?;
            }
            b.method(ty, "op_UnaryMinus").param(ty).returns(ty).register()?;
        }
        for op in LOGICAL {
            binary(b, int, op, int)?;
            binary(b, bool_, op, bool_)?;
        }
        for op in ["op_Equality", "op_Inequality"] {
            binary(b, bool_, op, bool_)?;
            binary(b, string, op, bool_)?;
        }
        b.method(bool_, "op_UnaryNegation")
            .param(bool_)
            .returns(bool_)
            .register()?;
        b.method(string, "op_Addition")
            .param(string)
            .param(string)
            .returns(string)
            .extern_name("SystemString.__Concat__SystemString_SystemString__SystemString")
            .register()?;

        b.method(int, "Parse").param(string).returns(int).register()?;
        b.method(int, "TryParse")
            .param(string)
            .out_param(int)
            .returns(bool_)
            .register()?;
        b.method(float, "Parse").param(string).returns(float).register()?;
        b.method(float, "TryParse")
            .param(string)
            .out_param(float)
            .returns(bool_)
            .register()?;
        for ty in [int, float, bool_] {
            b.instance(ty, "ToString").returns(string).register()?;
        }
        b.instance(string, "get_Length").returns(int).register()?;
        b.method(object, "ReferenceEquals")
            .param(object)
            .param(object)
            .returns(bool_)
            .register()?;

        for elem in [int, float, bool_, string, object] {
            let array = b.types().array_of(elem);
            b.method(array, "ctor").param(int).returns(array).register()?;
            b.instance(array, "get_Length").returns(int).register()?;
            b.instance(array, "Get").param(int).returns(elem).register()?;
            b.instance(array, "Set").param(int).param(elem).register()?;
        }

        let debug = b.declare_namespace("Debug", "UnityEngineDebug");
        for ty in [int, float, bool_, string, object] {
            b.method(debug, "Log")
                .param(ty)
                .extern_name("UnityEngineDebug.__Log__SystemObject__SystemVoid")
                .register()?;
        }

        let random = b.declare_namespace("Random", "UnityEngineRandom");
        for ty in [int, float] {
            b.method(random, "Range")
                .param(ty)
                .param(ty)
                .returns(ty)
                .nondeterministic()
                .register()?;
        }
        b.method(random, "get_value")
            .returns(float)
            .nondeterministic()
            .register()?;

        let time = b.declare_namespace("Time", "UnityEngineTime");
        b.method(time, "get_timeScale").returns(float).register()?;
        b.method(time, "set_timeScale").param(float).register()?;

        let mathf = b.declare_namespace("Mathf", "UnityEngineMathf");
        for ty in [int, float] {
            b.method(mathf, "Abs").param(ty).returns(ty).register()?;
            b.method(mathf, "Max").param(ty).param(ty).returns(ty).register()?;
            b.method(mathf, "Min").param(ty).param(ty).returns(ty).register()?;
        }

        let convert = b.declare_namespace("Convert", "SystemConvert");
        b.method(convert, "ToSingle").param(int).returns(float).register()?;
        b.method(convert, "ToInt32").param(float).returns(int).register()?;

        debug!("standard catalog registered");
        Ok(())
    }
}

fn binary(
    b: &mut CatalogBuilder<'_>,
    ty: TypeId,
    op: &str,
    ret: TypeId,
) -> Result<(), RegistrationError> {
    b.method(ty, op).param(ty).param(ty).returns(ret).register()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MethodKind, MethodRegistry, ParamDirection};
    use tessera_core::QualifierId;

    fn standard() -> (TypeTable, MethodRegistry) {
        let mut types = TypeTable::new();
        let mut registry = MethodRegistry::new();
        StandardCatalog
            .register(&mut CatalogBuilder::new(&mut types, &mut registry))
            .unwrap();
        (types, registry)
    }

    #[test]
    fn registers_operators_on_primitives() {
        let (types, registry) = standard();
        assert_eq!(
            registry.candidates(&types, TypeTable::FLOAT, "op_Multiplication").len(),
            1
        );
        assert_eq!(
            registry.candidates(&types, TypeTable::BOOL, "op_LogicalAnd").len(),
            1
        );
        assert!(registry.candidates(&types, TypeTable::STRING, "op_Subtraction").is_empty());
    }

    #[test]
    fn arrays_share_one_family_group() {
        let (mut types, registry) = standard();
        let arr = types.array_of(TypeTable::FLOAT);
        let gets = registry.candidates(&types, arr, "Get");
        assert_eq!(gets.len(), 5);
        assert!(gets.iter().all(|&id| registry.get(id).kind == MethodKind::Instance));

        let ctor = registry
            .candidates(&types, arr, "ctor")
            .iter()
            .map(|&id| registry.get(id))
            .find(|m| m.owner == arr)
            .unwrap();
        assert_eq!(
            ctor.extern_name,
            "SystemSingleArray.__ctor__SystemInt32__SystemSingleArray"
        );
    }

    #[test]
    fn random_is_nondeterministic() {
        let (types, registry) = standard();
        let random = types.lookup(QualifierId::ROOT, "Random").unwrap();
        let value = registry.candidates(&types, random, "get_value");
        assert_eq!(value.len(), 1);
        let method = registry.get(value[0]);
        assert!(!method.deterministic);
        assert_eq!(method.extern_name, "UnityEngineRandom.__get_value__SystemSingle");
    }

    #[test]
    fn time_scale_is_a_writable_property() {
        let (types, registry) = standard();
        let time = types.lookup(QualifierId::ROOT, "Time").unwrap();
        let set = registry.candidates(&types, time, "set_timeScale");
        assert_eq!(set.len(), 1);
        assert_eq!(
            registry.get(set[0]).extern_name,
            "UnityEngineTime.__set_timeScale__SystemSingle__SystemVoid"
        );
        assert!(registry.has_member(&types, time, "get_timeScale"));
    }

    #[test]
    fn try_parse_has_out_parameter() {
        let (types, registry) = standard();
        let ids = registry.candidates(&types, TypeTable::INT, "TryParse");
        let method = registry.get(ids[0]);
        assert_eq!(
            method.directions,
            vec![ParamDirection::In, ParamDirection::Out]
        );
    }
}
