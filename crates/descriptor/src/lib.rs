//! Field and method descriptor parsing.
//!
//! Class files encode the type of every field and method as a compact
//! descriptor string (e.g. `(Ljava/lang/String;I)V`). The decoder needs
//! these parsed so call sites can be matched against catalog entries by
//! argument position and so static vs. receiver-bearing invocations can
//! be told apart by parameter count.

#![allow(dead_code)]

#[cfg(test)]
mod test;

use std::fmt;
use std::str::FromStr;

#[derive(Debug)]
pub struct ParseErr(pub String);

impl ParseErr {
    pub fn str(str: &'static str) -> Self {
        Self(str.to_owned())
    }
    pub fn string(str: String) -> Self {
        Self(str)
    }
}

impl fmt::Display for ParseErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "descriptor parse error: {}", self.0)
    }
}

impl std::error::Error for ParseErr {}

/// A field descriptor for the type of a field in a class.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct FieldDescriptor(pub FieldType);

/// The type of a field or method parameter.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum FieldType {
    /// B
    Byte,
    /// C
    Char,
    /// D
    Double,
    /// F
    Float,
    /// I
    Int,
    /// J
    Long,
    /// L `ClassName` ;
    Object(String),
    /// S
    Short,
    /// Z
    Boolean,
    /// [
    Array(Box<Self>),
}

/// A method descriptor for the type of a method in a class.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct MethodDescriptor {
    parameters: Vec<FieldType>,
    return_: MethodType,
}

/// The type of a method's return value.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum MethodType {
    Some(FieldType),
    /// V
    Void,
}

impl FromStr for FieldDescriptor {
    type Err = ParseErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(FieldType::from_char_iter(&mut s.chars())?))
    }
}

impl FieldType {
    /// Consumes as many chars as needed from the char iterator and tries to parse itself.
    pub fn from_char_iter<I>(chars: &mut I) -> Result<Self, ParseErr>
    where
        I: Iterator<Item = char>,
    {
        let first = chars.next().ok_or_else(|| ParseErr::str("empty string"))?;
        Ok(match first {
            'B' => Self::Byte,
            'C' => Self::Char,
            'D' => Self::Double,
            'F' => Self::Float,
            'I' => Self::Int,
            'J' => Self::Long,
            'L' => Self::Object({
                let mut name = String::with_capacity(32);
                loop {
                    let char = chars
                        .next()
                        .ok_or_else(|| ParseErr::str("expected ';' before end of string"))?;

                    if char == ';' {
                        break;
                    };
                    name.push(char);
                }
                name
            }),
            'S' => Self::Short,
            'Z' => Self::Boolean,
            '[' => Self::Array(Box::new(Self::from_char_iter(chars)?)),
            c => {
                return Err(ParseErr::string(format!(
                    "invalid char in field descriptor: {}",
                    c
                )))
            }
        })
    }
}

impl MethodDescriptor {
    /// Number of formal parameters. Does not count an implicit receiver —
    /// callers distinguish `invokestatic` from `invokevirtual`/`invokeinterface`/
    /// `invokespecial` separately, at the call-site decoding layer.
    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    pub fn parameters(&self) -> &[FieldType] {
        &self.parameters
    }

    pub fn return_type(&self) -> &MethodType {
        &self.return_
    }

    /// Renders the canonical `returnType name(paramTypes)` signature used
    /// for findings and reports.
    pub fn canonical_signature(&self, method_name: &str) -> String {
        let params: Vec<String> = self.parameters.iter().map(ToString::to_string).collect();
        format!("{} {}({})", self.return_, method_name, params.join(", "))
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Byte => write!(f, "byte"),
            FieldType::Char => write!(f, "char"),
            FieldType::Double => write!(f, "double"),
            FieldType::Float => write!(f, "float"),
            FieldType::Int => write!(f, "int"),
            FieldType::Long => write!(f, "long"),
            FieldType::Short => write!(f, "short"),
            FieldType::Boolean => write!(f, "boolean"),
            FieldType::Object(name) => {
                let simple = name.rsplit('/').next().unwrap_or(name);
                write!(f, "{simple}")
            }
            FieldType::Array(inner) => write!(f, "{inner}[]"),
        }
    }
}

impl fmt::Display for MethodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodType::Some(t) => write!(f, "{t}"),
            MethodType::Void => write!(f, "void"),
        }
    }
}

impl FromStr for MethodDescriptor {
    type Err = ParseErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars().peekable();
        if chars.next().ok_or_else(|| ParseErr::str("empty string"))? != '(' {
            return Err(ParseErr::str("needs to start with '('"));
        }

        let mut parameters = Vec::new();

        loop {
            if let Some(')') = chars.peek() {
                let _ = chars.next();
                break;
            }
            parameters.push(FieldType::from_char_iter(&mut chars)?);
        }

        let return_ = if let Some('V') = chars.peek() {
            MethodType::Void
        } else {
            MethodType::Some(FieldType::from_char_iter(&mut chars)?)
        };

        Ok(Self {
            parameters,
            return_,
        })
    }
}
