//! Binary cursor parsing of the class file format. Structure follows the
//! `Data`/`Parse` idiom: a cursor that reads big-endian primitives, one
//! parse function per struct, and a post-pass that resolves attributes
//! (by name, against the constant pool) once the pool is fully read.

use thiserror::Error;

use crate::model::{
    AttributeInfo, ClassFile, CodeAttribute, CpIndex, CpInfo, ExceptionTableEntry, FieldInfo,
    LineNumberEntry, MethodInfo, U1, U2, U4,
};

#[derive(Debug, Error)]
pub enum MalformedClassError {
    #[error("{path}: {reason} (offset {offset})")]
    Parse {
        path: String,
        reason: String,
        offset: usize,
    },
}

type Result<T> = std::result::Result<T, ParseErr>;

struct ParseErr(String);

struct Data<'a> {
    data: &'a [U1],
    pointer: usize,
}

impl<'a> Data<'a> {
    fn new(data: &'a [U1]) -> Self {
        Data { data, pointer: 0 }
    }

    fn u1(&mut self) -> Result<U1> {
        let item = self.data.get(self.pointer).copied();
        self.pointer += 1;
        item.ok_or_else(|| ParseErr("unexpected end of data reading u1".to_owned()))
    }

    fn u2(&mut self) -> Result<U2> {
        Ok(((self.u1()? as U2) << 8) | self.u1()? as U2)
    }

    fn u4(&mut self) -> Result<U4> {
        Ok(((self.u2()? as U4) << 16) | self.u2()? as U4)
    }

    fn cp<T>(&mut self) -> Result<CpIndex<T>> {
        Ok(self.u2()?.into())
    }
}

fn parse_vec<T, F>(len: usize, data: &mut Data, mut one: F) -> Result<Vec<T>>
where
    F: FnMut(&mut Data) -> Result<T>,
{
    let mut vec = Vec::with_capacity(len);
    for _ in 0..len {
        vec.push(one(data)?);
    }
    Ok(vec)
}

fn parse_bytes(len: usize, data: &mut Data) -> Result<Vec<U1>> {
    parse_vec(len, data, |d| d.u1())
}

/// An attribute before its name has been resolved against the constant pool.
struct RawAttribute {
    name_index: U2,
    content: Vec<U1>,
}

struct RawMember {
    access_flags: U2,
    name_index: U2,
    descriptor_index: U2,
    attributes: Vec<RawAttribute>,
}

/// Parses a whole class file. Constant pool index 0 is never valid and is
/// represented by a placeholder `Unusable` entry so 1-based indices line
/// up directly with `Vec` positions; `Long`/`Double` entries occupy the
/// slot after them the same way, per the format's own quirky indexing.
pub fn parse_class_file(
    path: &str,
    data: &[u8],
) -> std::result::Result<ClassFile, MalformedClassError> {
    let mut cursor = Data::new(data);
    parse_inner(&mut cursor).map_err(|e| MalformedClassError::Parse {
        path: path.to_owned(),
        reason: e.0,
        offset: cursor.pointer,
    })
}

fn parse_inner(data: &mut Data) -> Result<ClassFile> {
    let magic = data.u4()?;
    if magic != 0xCAFE_BABE {
        return Err(ParseErr(format!("bad magic number 0x{magic:08X}")));
    }
    let minor_version = data.u2()?;
    let major_version = data.u2()?;

    let cp_count = data.u2()?;
    let mut constant_pool = Vec::with_capacity(cp_count as usize);
    while constant_pool.len() + 1 < cp_count as usize {
        let info = parse_cp_info(data)?;
        let occupies_two = matches!(info, CpInfo::Long { .. } | CpInfo::Double { .. });
        constant_pool.push(info);
        if occupies_two {
            constant_pool.push(CpInfo::Unusable);
        }
    }

    let access_flags = data.u2()?;
    let this_class = data.cp()?;
    let super_class = data.cp()?;
    let interfaces_count = data.u2()?;
    let interfaces = parse_vec(interfaces_count as usize, data, |d| d.cp())?;
    let fields_count = data.u2()?;
    let raw_fields = parse_vec(fields_count as usize, data, parse_raw_member)?;
    let methods_count = data.u2()?;
    let raw_methods = parse_vec(methods_count as usize, data, parse_raw_member)?;
    let attributes_count = data.u2()?;
    let raw_attributes = parse_vec(attributes_count as usize, data, parse_raw_attribute)?;

    let attributes = resolve_attributes(raw_attributes, &constant_pool)?;
    let fields = raw_fields
        .into_iter()
        .map(|m| resolve_member(m, &constant_pool))
        .collect::<Result<Vec<_>>>()?;
    let methods = raw_methods
        .into_iter()
        .map(|m| resolve_method(m, &constant_pool))
        .collect::<Result<Vec<_>>>()?;

    Ok(ClassFile {
        minor_version,
        major_version,
        constant_pool,
        access_flags,
        this_class,
        super_class,
        interfaces,
        fields,
        methods,
        attributes,
    })
}

fn parse_cp_info(data: &mut Data) -> Result<CpInfo> {
    let tag = data.u1()?;
    Ok(match tag {
        7 => CpInfo::Class {
            name_index: data.cp()?,
        },
        9 => CpInfo::Fieldref {
            class_index: data.cp()?,
            name_and_type_index: data.cp()?,
        },
        10 => CpInfo::Methodref {
            class_index: data.cp()?,
            name_and_type_index: data.cp()?,
        },
        11 => CpInfo::InterfaceMethodref {
            class_index: data.cp()?,
            name_and_type_index: data.cp()?,
        },
        8 => CpInfo::String {
            string_index: data.cp()?,
        },
        3 => CpInfo::Integer { bytes: data.u4()? },
        4 => CpInfo::Float { bytes: data.u4()? },
        5 => CpInfo::Long {
            high_bytes: data.u4()?,
            low_bytes: data.u4()?,
        },
        6 => CpInfo::Double {
            high_bytes: data.u4()?,
            low_bytes: data.u4()?,
        },
        12 => CpInfo::NameAndType {
            name_index: data.cp()?,
            descriptor_index: data.cp()?,
        },
        1 => {
            let len = data.u2()?;
            let bytes = parse_bytes(len as usize, data)?;
            CpInfo::Utf8(
                String::from_utf8(bytes)
                    .map_err(|e| ParseErr(format!("invalid utf8 in constant pool entry: {e}")))?,
            )
        }
        15 => CpInfo::MethodHandle {
            reference_kind: data.u1()?,
            reference_index: data.u2()?,
        },
        16 => CpInfo::MethodType {
            descriptor_index: data.cp()?,
        },
        18 => CpInfo::InvokeDynamic {
            bootstrap_method_attr_index: data.u2()?,
            name_and_type_index: data.cp()?,
        },
        17 => CpInfo::Dynamic {
            bootstrap_method_attr_index: data.u2()?,
            name_and_type_index: data.cp()?,
        },
        19 => CpInfo::Module {
            name_index: data.cp()?,
        },
        20 => CpInfo::Package {
            name_index: data.cp()?,
        },
        _ => return Err(ParseErr(format!("invalid constant pool tag {tag}"))),
    })
}

fn parse_raw_member(data: &mut Data) -> Result<RawMember> {
    Ok(RawMember {
        access_flags: data.u2()?,
        name_index: data.u2()?,
        descriptor_index: data.u2()?,
        attributes: parse_vec(data.u2()? as usize, data, parse_raw_attribute)?,
    })
}

fn parse_raw_attribute(data: &mut Data) -> Result<RawAttribute> {
    let name_index = data.u2()?;
    let length = data.u4()?;
    let content = parse_bytes(length as usize, data)?;
    Ok(RawAttribute {
        name_index,
        content,
    })
}

fn resolve_member(raw: RawMember, pool: &[CpInfo]) -> Result<FieldInfo> {
    Ok(FieldInfo {
        access_flags: raw.access_flags,
        name_index: raw.name_index.into(),
        descriptor_index: raw.descriptor_index.into(),
        attributes: resolve_attributes(raw.attributes, pool)?,
    })
}

fn resolve_method(raw: RawMember, pool: &[CpInfo]) -> Result<MethodInfo> {
    Ok(MethodInfo {
        access_flags: raw.access_flags,
        name_index: raw.name_index.into(),
        descriptor_index: raw.descriptor_index.into(),
        attributes: resolve_attributes(raw.attributes, pool)?,
    })
}

fn resolve_attributes(raw: Vec<RawAttribute>, pool: &[CpInfo]) -> Result<Vec<AttributeInfo>> {
    raw.into_iter().map(|a| resolve_attribute(a, pool)).collect()
}

fn utf8_at(pool: &[CpInfo], index: U2) -> Result<&str> {
    match pool.get(index as usize - 1) {
        Some(CpInfo::Utf8(s)) => Ok(s.as_str()),
        Some(_) => Err(ParseErr(format!(
            "constant pool entry {index} is not Utf8"
        ))),
        None => Err(ParseErr(format!(
            "constant pool index {index} out of bounds"
        ))),
    }
}

fn resolve_attribute(raw: RawAttribute, pool: &[CpInfo]) -> Result<AttributeInfo> {
    let name = utf8_at(pool, raw.name_index)?.to_owned();
    let mut data = Data::new(&raw.content);

    Ok(match name.as_str() {
        "Code" => {
            let max_stack = data.u2()?;
            let max_locals = data.u2()?;
            let code_length = data.u4()?;
            let code = parse_bytes(code_length as usize, &mut data)?;
            let exception_table_len = data.u2()?;
            let exception_table = parse_vec(exception_table_len as usize, &mut data, |d| {
                Ok(ExceptionTableEntry {
                    start_pc: d.u2()?,
                    end_pc: d.u2()?,
                    handler_pc: d.u2()?,
                    catch_type: d.u2()?,
                })
            })?;
            let attributes_count = data.u2()?;
            let nested_raw = parse_vec(attributes_count as usize, &mut data, parse_raw_attribute)?;
            let nested = resolve_attributes(nested_raw, pool)?;
            let line_number_table = nested
                .into_iter()
                .find_map(|a| match a {
                    AttributeInfo::Unrecognized { name, content } if name == "LineNumberTable" => {
                        Some(content)
                    }
                    _ => None,
                })
                .map(|content| parse_line_number_table(&content))
                .transpose()?
                .unwrap_or_default();

            AttributeInfo::Code(CodeAttribute {
                max_stack,
                max_locals,
                code,
                exception_table,
                line_number_table,
            })
        }
        "ConstantValue" => AttributeInfo::ConstantValue {
            constantvalue_index: data.u2()?,
        },
        "SourceFile" => AttributeInfo::SourceFile {
            sourcefile_index: data.cp()?,
        },
        "Signature" => AttributeInfo::Signature {
            signature_index: data.cp()?,
        },
        "Deprecated" => AttributeInfo::Deprecated,
        "Synthetic" => AttributeInfo::Synthetic,
        _ => AttributeInfo::Unrecognized {
            name,
            content: raw.content,
        },
    })
}

fn parse_line_number_table(content: &[U1]) -> Result<Vec<LineNumberEntry>> {
    let mut data = Data::new(content);
    let count = data.u2()?;
    parse_vec(count as usize, &mut data, |d| {
        Ok(LineNumberEntry {
            start_pc: d.u2()?,
            line_number: d.u2()?,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_magic() {
        let bytes = [0u8, 0, 0, 0];
        let err = parse_class_file("test.class", &bytes);
        assert!(err.is_err());
    }

    #[test]
    fn rejects_truncated_input() {
        let bytes = [0xCA, 0xFE, 0xBA, 0xBE, 0x00];
        let err = parse_class_file("test.class", &bytes);
        assert!(err.is_err());
    }
}
