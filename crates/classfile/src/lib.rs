mod corpus;
mod instructions;
mod model;
mod parse;

pub use corpus::{walk_corpus, CorpusEntry, CorpusIoError};
pub use instructions::{decode_instructions, Instruction, InvokeKind};
pub use model::{
    AttributeInfo, ClassFile, ClassInfo, CodeAttribute, CpIndex, CpInfo, ExceptionTableEntry,
    FieldInfo, LineNumberEntry, MethodInfo, NameAndTypeInfo, Utf8Info,
};
pub use parse::{parse_class_file, MalformedClassError};
