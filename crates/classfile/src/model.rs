//! The class file data model: constant pool, methods, fields, and the
//! subset of attributes the decoder and scanner need.

use std::marker::PhantomData;

pub type U1 = u8;
pub type U2 = u16;
pub type U4 = u32;

/// A type-tagged index into the constant pool. Carries no runtime cost
/// over a raw `u16`; the phantom type just keeps call sites from mixing
/// up, say, a class index and a name-and-type index.
pub struct CpIndex<T> {
    index: U2,
    _marker: PhantomData<fn() -> T>,
}

impl<T> CpIndex<T> {
    pub fn index(&self) -> U2 {
        self.index
    }
}

impl<T> From<U2> for CpIndex<T> {
    fn from(index: U2) -> Self {
        Self {
            index,
            _marker: PhantomData,
        }
    }
}

impl<T> Clone for CpIndex<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for CpIndex<T> {}

impl<T> std::fmt::Debug for CpIndex<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.index)
    }
}

#[derive(Debug)]
pub struct Utf8Info;
#[derive(Debug)]
pub struct ClassInfo;
#[derive(Debug)]
pub struct NameAndTypeInfo;

#[derive(Debug)]
pub struct ClassFile {
    pub minor_version: U2,
    pub major_version: U2,
    pub constant_pool: Vec<CpInfo>,
    pub access_flags: U2,
    pub this_class: CpIndex<ClassInfo>,
    pub super_class: CpIndex<ClassInfo>,
    pub interfaces: Vec<CpIndex<ClassInfo>>,
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<MethodInfo>,
    pub attributes: Vec<AttributeInfo>,
}

impl ClassFile {
    /// Resolves a `Utf8` entry. Constant pool indices are 1-based.
    pub fn utf8_at(&self, index: U2) -> Option<&str> {
        match self.constant_pool.get(index as usize - 1)? {
            CpInfo::Utf8(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn class_name_at(&self, index: CpIndex<ClassInfo>) -> Option<&str> {
        match self.constant_pool.get(index.index() as usize - 1)? {
            CpInfo::Class { name_index } => self.utf8_at(name_index.index()),
            _ => None,
        }
    }

    pub fn this_class_name(&self) -> Option<&str> {
        self.class_name_at(self.this_class)
    }

    pub fn name_and_type_at(&self, index: CpIndex<NameAndTypeInfo>) -> Option<(&str, &str)> {
        match self.constant_pool.get(index.index() as usize - 1)? {
            CpInfo::NameAndType {
                name_index,
                descriptor_index,
            } => Some((self.utf8_at(name_index.index())?, self.utf8_at(descriptor_index.index())?)),
            _ => None,
        }
    }

    /// Resolves a Methodref/InterfaceMethodref-shaped entry to
    /// `(declaring_class, method_name, descriptor)`.
    pub fn method_ref_at(&self, index: U2) -> Option<(&str, &str, &str)> {
        let (class_index, nat_index) = match self.constant_pool.get(index as usize - 1)? {
            CpInfo::Methodref {
                class_index,
                name_and_type_index,
            }
            | CpInfo::InterfaceMethodref {
                class_index,
                name_and_type_index,
            } => (*class_index, *name_and_type_index),
            _ => return None,
        };
        let class = self.class_name_at(class_index)?;
        let (name, descriptor) = self.name_and_type_at(nat_index)?;
        Some((class, name, descriptor))
    }

    pub fn string_constant_at(&self, index: U2) -> Option<&str> {
        match self.constant_pool.get(index as usize - 1)? {
            CpInfo::String { string_index } => self.utf8_at(string_index.index()),
            _ => None,
        }
    }

    /// The class's `SourceFile` attribute, if present.
    pub fn source_file(&self) -> Option<&str> {
        self.attributes.iter().find_map(|a| match a {
            AttributeInfo::SourceFile { sourcefile_index } => self.utf8_at(sourcefile_index.index()),
            _ => None,
        })
    }
}

#[derive(Debug)]
pub enum CpInfo {
    Class {
        name_index: CpIndex<Utf8Info>,
    },
    Fieldref {
        class_index: CpIndex<ClassInfo>,
        name_and_type_index: CpIndex<NameAndTypeInfo>,
    },
    Methodref {
        class_index: CpIndex<ClassInfo>,
        name_and_type_index: CpIndex<NameAndTypeInfo>,
    },
    InterfaceMethodref {
        class_index: CpIndex<ClassInfo>,
        name_and_type_index: CpIndex<NameAndTypeInfo>,
    },
    String {
        string_index: CpIndex<Utf8Info>,
    },
    Integer {
        bytes: U4,
    },
    Float {
        bytes: U4,
    },
    Long {
        high_bytes: U4,
        low_bytes: U4,
    },
    Double {
        high_bytes: U4,
        low_bytes: U4,
    },
    NameAndType {
        name_index: CpIndex<Utf8Info>,
        descriptor_index: CpIndex<Utf8Info>,
    },
    Utf8(String),
    MethodHandle {
        reference_kind: U1,
        reference_index: U2,
    },
    MethodType {
        descriptor_index: CpIndex<Utf8Info>,
    },
    InvokeDynamic {
        bootstrap_method_attr_index: U2,
        name_and_type_index: CpIndex<NameAndTypeInfo>,
    },
    Dynamic {
        bootstrap_method_attr_index: U2,
        name_and_type_index: CpIndex<NameAndTypeInfo>,
    },
    Module {
        name_index: CpIndex<Utf8Info>,
    },
    Package {
        name_index: CpIndex<Utf8Info>,
    },
    /// The second slot consumed by a `Long`/`Double` entry, per the class
    /// file spec's "the next usable entry is at index n+2" rule.
    Unusable,
}

#[derive(Debug)]
pub struct FieldInfo {
    pub access_flags: U2,
    pub name_index: CpIndex<Utf8Info>,
    pub descriptor_index: CpIndex<Utf8Info>,
    pub attributes: Vec<AttributeInfo>,
}

#[derive(Debug)]
pub struct MethodInfo {
    pub access_flags: U2,
    pub name_index: CpIndex<Utf8Info>,
    pub descriptor_index: CpIndex<Utf8Info>,
    pub attributes: Vec<AttributeInfo>,
}

impl MethodInfo {
    pub fn code(&self) -> Option<&CodeAttribute> {
        self.attributes.iter().find_map(|a| match a {
            AttributeInfo::Code(code) => Some(code),
            _ => None,
        })
    }
}

#[derive(Debug)]
pub struct ExceptionTableEntry {
    pub start_pc: U2,
    pub end_pc: U2,
    pub handler_pc: U2,
    pub catch_type: U2,
}

#[derive(Debug)]
pub struct LineNumberEntry {
    pub start_pc: U2,
    pub line_number: U2,
}

#[derive(Debug)]
pub struct CodeAttribute {
    pub max_stack: U2,
    pub max_locals: U2,
    pub code: Vec<U1>,
    pub exception_table: Vec<ExceptionTableEntry>,
    pub line_number_table: Vec<LineNumberEntry>,
}

impl CodeAttribute {
    /// The source line covering `pc`, or `-1` if no table entry does.
    pub fn line_for_pc(&self, pc: usize) -> i64 {
        self.line_number_table
            .iter()
            .filter(|e| e.start_pc as usize <= pc)
            .max_by_key(|e| e.start_pc)
            .map(|e| e.line_number as i64)
            .unwrap_or(-1)
    }
}

#[derive(Debug)]
pub enum AttributeInfo {
    Code(CodeAttribute),
    ConstantValue { constantvalue_index: U2 },
    SourceFile { sourcefile_index: CpIndex<Utf8Info> },
    Signature { signature_index: CpIndex<Utf8Info> },
    Deprecated,
    Synthetic,
    /// Any attribute this decoder doesn't give special meaning to. Kept
    /// as raw bytes rather than rejected, since vendor/tooling attributes
    /// are common and never affect call-site matching.
    Unrecognized { name: String, content: Vec<U1> },
}
