//! Compiled-type metadata model for ahead-of-time bootstrap generation.
//!
//! The `aot-model` crate describes an application the way its compiled classes
//! would: types with their constructors, methods, fields, annotations,
//! registration conditions and native-image hints. The generator reads this
//! model instead of reflecting over the application at run time.
//!
//! # Entry Point
//!
//! ```
//! use aot_model::{TypeDescriptor, TypeIndex};
//!
//! let index = TypeIndex::from_types([TypeDescriptor::class("com.example.Greeter")]);
//! assert!(index.is_present("com.example.Greeter"));
//! assert!(index.is_present("java.lang.String"));
//! ```
//!
//! Classes directories carry the model as `*.types.json` documents, loaded with
//! [`TypeIndex::load`].

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

pub mod hints;
pub mod index;
pub mod properties;
pub mod types;

pub use hints::{AccessBits, FieldHint, MethodHint, NativeHint, ProxyHint, ResourceHint, TypeHint};
pub use index::{IndexError, TypeIndex};
pub use types::{
    annotations, BeanDeclaration, Condition, ConstructorDescriptor, FieldDescriptor,
    MethodDescriptor, ParameterDescriptor, ResolvableType, TestContextDeclaration,
    TypeDescriptor, TypeKind, TypeParseError, Visibility,
};
