//! Host method descriptors.

use tessera_core::{SignatureHash, TypeId, TypeTable};

/// Index of a method in the [`MethodRegistry`](crate::MethodRegistry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodId(pub u32);

/// How a parameter passes its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamDirection {
    /// Read by the method.
    In,
    /// Written by the method.
    Out,
    /// Read and written by the method.
    InOut,
}

impl ParamDirection {
    /// Whether the method writes the argument.
    pub fn writes(self) -> bool {
        !matches!(self, ParamDirection::In)
    }
}

/// Static or receiver-taking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodKind {
    /// Called through the owner type or namespace.
    Static,
    /// Called on a value; the receiver is parameter 0.
    Instance,
}

/// A host-callable operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    /// Declaring type or namespace.
    pub owner: TypeId,
    /// Member name (`op_Addition`, `get_Length`, `Log`).
    pub name: String,
    /// Static or instance.
    pub kind: MethodKind,
    /// Parameter types; for instance methods the receiver comes first.
    pub params: Vec<TypeId>,
    /// Direction of each parameter.
    pub directions: Vec<ParamDirection>,
    /// Result types.
    pub outputs: Vec<TypeId>,
    /// Name of the host entry point.
    pub extern_name: String,
    /// Whether repeated calls with equal inputs yield equal outputs.
    pub deterministic: bool,
}

impl Method {
    /// The type of a call expression: `void`, the single output, or a tuple.
    pub fn result_type(&self, types: &mut TypeTable) -> TypeId {
        match self.outputs.as_slice() {
            [] => TypeTable::VOID,
            [single] => *single,
            many => types.tuple_of(many),
        }
    }

    /// Parameters the caller supplies, excluding the receiver.
    pub fn explicit_params(&self) -> &[TypeId] {
        match self.kind {
            MethodKind::Static => &self.params,
            MethodKind::Instance => &self.params[1..],
        }
    }

    /// Identity of the overload for duplicate detection.
    pub fn signature_hash(&self, types: &TypeTable) -> SignatureHash {
        let params: Vec<u32> = self.params.iter().map(|p| p.0).collect();
        SignatureHash::from_method(&types.display(self.owner), &self.name, &params)
    }

    /// Render as `owner.name(a, b) -> r` for diagnostics.
    pub fn describe(&self, types: &TypeTable) -> String {
        let params = self
            .params
            .iter()
            .zip(&self.directions)
            .map(|(&ty, dir)| match dir {
                ParamDirection::In => types.display(ty),
                ParamDirection::Out => format!("out {}", types.display(ty)),
                ParamDirection::InOut => format!("inout {}", types.display(ty)),
            })
            .collect::<Vec<_>>()
            .join(", ");
        let outputs = match self.outputs.as_slice() {
            [] => "void".to_string(),
            [single] => types.display(*single),
            many => {
                let parts: Vec<_> = many.iter().map(|&t| types.display(t)).collect();
                format!("({})", parts.join(", "))
            }
        };
        format!(
            "{}.{}({}) -> {}",
            types.display(self.owner),
            self.name,
            params,
            outputs
        )
    }
}
