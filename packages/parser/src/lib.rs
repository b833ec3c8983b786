pub mod ast;
pub mod error;
pub mod id_generator;
pub mod lexer;
pub mod registry;
pub mod serializer;
pub mod template;
pub mod tokenizer;
pub mod visitor;

#[cfg(test)]
mod tests_serializer;
#[cfg(test)]
mod tests_tokenizer;

pub use ast::{Document, Node, PlaceholderNode, RawValue, TextRun, NULL_SENTINEL};
pub use error::{RegistryError, RegistryResult};
pub use id_generator::IDGenerator;
pub use registry::{ComponentDefinition, ComponentRegistry, CompiledComponent};
pub use serializer::{serialize, SerializeOptions, Serializer};
pub use tokenizer::{scan, scan_restored, MarkerMatch, Tokenizer};
