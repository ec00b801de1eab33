//! Hand-assembled class files for tests.
//!
//! The builder emits bytes directly rather than going through [`crate::ClassFile`],
//! so tests of the reader and writer do not validate the code against itself.

use crate::mutf8;

/// Builds a small but realistic class:
///
/// * implements `java/io/Serializable`
/// * `static final long COUNT = 42L` (a two-slot `Long` constant)
/// * a `Double` and a NaN-payload `Float` constant nobody references
/// * `<init>()V` with a real `Code` attribute calling `super()`
#[derive(Debug, Clone)]
pub struct ClassBuilder {
    this_class: String,
    major: u16,
    minor: u16,
    has_super: bool,
    this_class_index: Option<u16>,
    class_attributes: Vec<ClassAttribute>,
}

#[derive(Debug, Clone)]
enum ClassAttribute {
    SourceFile(String),
    SourceLocation(String),
}

impl ClassBuilder {
    pub fn new(this_class: impl Into<String>) -> Self {
        Self {
            this_class: this_class.into(),
            major: 52,
            minor: 0,
            has_super: true,
            this_class_index: None,
            class_attributes: Vec::new(),
        }
    }

    pub fn version(mut self, major: u16, minor: u16) -> Self {
        self.major = major;
        self.minor = minor;
        self
    }

    /// Emits `super_class = 0`, as `java/lang/Object` does.
    pub fn no_super(mut self) -> Self {
        self.has_super = false;
        self
    }

    /// Overrides the `this_class` index, e.g. to point it at the wrong constant.
    pub fn this_class_index(mut self, index: u16) -> Self {
        self.this_class_index = Some(index);
        self
    }

    pub fn source_file(mut self, name: impl Into<String>) -> Self {
        self.class_attributes
            .push(ClassAttribute::SourceFile(name.into()));
        self
    }

    /// Adds a `SourceLocation` attribute. Calling it twice produces a
    /// (malformed) class with two of them.
    pub fn source_location(mut self, path: impl Into<String>) -> Self {
        self.class_attributes
            .push(ClassAttribute::SourceLocation(path.into()));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut pool = Pool::default();
        let this_name = pool.utf8(&self.this_class);
        let this_class = pool.class(this_name);
        let object_name = pool.utf8("java/lang/Object");
        let object = pool.class(object_name);
        let serializable_name = pool.utf8("java/io/Serializable");
        let serializable = pool.class(serializable_name);
        let init = pool.utf8("<init>");
        let void_desc = pool.utf8("()V");
        let init_nat = pool.name_and_type(init, void_desc);
        let super_init = pool.methodref(object, init_nat);
        let code = pool.utf8("Code");
        let count = pool.utf8("COUNT");
        let long_desc = pool.utf8("J");
        let constant_value = pool.utf8("ConstantValue");
        let forty_two = pool.long(42);
        pool.double(2.5f64.to_bits());
        pool.float(0x7FC0_0001);

        let mut attrs: Vec<(u16, Vec<u8>)> = Vec::new();
        for attr in &self.class_attributes {
            let (name, value) = match attr {
                ClassAttribute::SourceFile(v) => ("SourceFile", v),
                ClassAttribute::SourceLocation(v) => ("SourceLocation", v),
            };
            let name_index = pool.utf8(name);
            let value_index = pool.utf8(value);
            attrs.push((name_index, value_index.to_be_bytes().to_vec()));
        }

        let mut out = Vec::new();
        put_u4(&mut out, 0xCAFE_BABE);
        put_u2(&mut out, self.minor);
        put_u2(&mut out, self.major);
        put_u2(&mut out, pool.next_index);
        out.extend_from_slice(&pool.bytes);

        put_u2(&mut out, 0x0021); // ACC_PUBLIC | ACC_SUPER
        put_u2(&mut out, self.this_class_index.unwrap_or(this_class));
        put_u2(&mut out, if self.has_super { object } else { 0 });
        put_u2(&mut out, 1);
        put_u2(&mut out, serializable);

        // fields
        put_u2(&mut out, 1);
        put_u2(&mut out, 0x0019); // ACC_PUBLIC | ACC_STATIC | ACC_FINAL
        put_u2(&mut out, count);
        put_u2(&mut out, long_desc);
        put_u2(&mut out, 1);
        put_u2(&mut out, constant_value);
        put_u4(&mut out, 2);
        put_u2(&mut out, forty_two);

        // methods
        let body: [u8; 5] = [
            0x2A, // aload_0
            0xB7, // invokespecial
            (super_init >> 8) as u8,
            super_init as u8,
            0xB1, // return
        ];
        let mut code_attr = Vec::new();
        put_u2(&mut code_attr, 1); // max_stack
        put_u2(&mut code_attr, 1); // max_locals
        put_u4(&mut code_attr, body.len() as u32);
        code_attr.extend_from_slice(&body);
        put_u2(&mut code_attr, 0); // exception_table_length
        put_u2(&mut code_attr, 0); // attributes_count

        put_u2(&mut out, 1);
        put_u2(&mut out, 0x0001);
        put_u2(&mut out, init);
        put_u2(&mut out, void_desc);
        put_u2(&mut out, 1);
        put_u2(&mut out, code);
        put_u4(&mut out, code_attr.len() as u32);
        out.extend_from_slice(&code_attr);

        put_u2(&mut out, attrs.len() as u16);
        for (name_index, info) in attrs {
            put_u2(&mut out, name_index);
            put_u4(&mut out, info.len() as u32);
            out.extend_from_slice(&info);
        }

        out
    }
}

#[derive(Debug)]
struct Pool {
    bytes: Vec<u8>,
    next_index: u16,
}

impl Default for Pool {
    fn default() -> Self {
        Self {
            bytes: Vec::new(),
            next_index: 1,
        }
    }
}

impl Pool {
    fn push(&mut self, slots: u16, entry: &[u8]) -> u16 {
        let index = self.next_index;
        self.bytes.extend_from_slice(entry);
        self.next_index += slots;
        index
    }

    fn utf8(&mut self, text: &str) -> u16 {
        let encoded = mutf8::encode(text);
        let mut entry = vec![1];
        put_u2(&mut entry, encoded.len() as u16);
        entry.extend_from_slice(&encoded);
        self.push(1, &entry)
    }

    fn class(&mut self, name_index: u16) -> u16 {
        let mut entry = vec![7];
        put_u2(&mut entry, name_index);
        self.push(1, &entry)
    }

    fn name_and_type(&mut self, name_index: u16, descriptor_index: u16) -> u16 {
        let mut entry = vec![12];
        put_u2(&mut entry, name_index);
        put_u2(&mut entry, descriptor_index);
        self.push(1, &entry)
    }

    fn methodref(&mut self, class_index: u16, nat_index: u16) -> u16 {
        let mut entry = vec![10];
        put_u2(&mut entry, class_index);
        put_u2(&mut entry, nat_index);
        self.push(1, &entry)
    }

    fn long(&mut self, value: i64) -> u16 {
        let mut entry = vec![5];
        entry.extend_from_slice(&value.to_be_bytes());
        self.push(2, &entry)
    }

    fn double(&mut self, bits: u64) -> u16 {
        let mut entry = vec![6];
        entry.extend_from_slice(&bits.to_be_bytes());
        self.push(2, &entry)
    }

    fn float(&mut self, bits: u32) -> u16 {
        let mut entry = vec![4];
        entry.extend_from_slice(&bits.to_be_bytes());
        self.push(1, &entry)
    }
}

fn put_u2(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn put_u4(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}
