//! The JDK subset every runtime carries: enough of `java.lang`, `java.io` and
//! `java.util` to type ordinary programs.

use javelin_core::access_flags::{ACC_ABSTRACT, ACC_FINAL, ACC_PROTECTED, ACC_PUBLIC, ACC_STATIC};
use javelin_types::ConstantValue;

use crate::builder::{HostClassBuilder as C, MethodBuilder as M};
use crate::host::{HostClass, HostTypeError};

const PUBLIC_FINAL: u16 = ACC_PUBLIC | ACC_FINAL;
const PUBLIC_STATIC: u16 = ACC_PUBLIC | ACC_STATIC;
const PUBLIC_ABSTRACT: u16 = ACC_PUBLIC | ACC_ABSTRACT;
/// Default interface methods; see [`M::modifiers`].
const DEFAULT: u16 = ACC_PUBLIC | ACC_FINAL;

pub(crate) fn classes() -> Vec<Result<HostClass, HostTypeError>> {
    let mut out = Vec::new();
    out.extend(java_lang().iter().map(C::build));
    out.extend(boxes().iter().map(C::build));
    out.extend(throwables().iter().map(C::build));
    out.extend(java_io().iter().map(C::build));
    out.extend(java_util().iter().map(C::build));
    out
}

fn java_lang() -> Vec<C> {
    vec![
        C::class("java.lang.Object")
            .superclass(None)
            .constructor(&[])
            .simple_method("equals", "boolean", &["java.lang.Object"])
            .simple_method("hashCode", "int", &[])
            .simple_method("toString", "java.lang.String", &[])
            .method(M::new("getClass", "java.lang.Class<?>", &[]).modifiers(PUBLIC_FINAL))
            .method(M::new("clone", "java.lang.Object", &[]).modifiers(ACC_PROTECTED).throws("java.lang.CloneNotSupportedException"))
            .method(M::new("notify", "void", &[]).modifiers(PUBLIC_FINAL))
            .method(M::new("wait", "void", &[]).modifiers(PUBLIC_FINAL).throws("java.lang.InterruptedException")),
        C::class("java.lang.Class")
            .modifiers(PUBLIC_FINAL)
            .type_param("T", &[])
            .implements("java.io.Serializable")
            .simple_method("getName", "java.lang.String", &[])
            .simple_method("getSimpleName", "java.lang.String", &[])
            .simple_method("isInstance", "boolean", &["java.lang.Object"])
            .simple_method("cast", "T", &["java.lang.Object"]),
        C::interface("java.lang.CharSequence")
            .simple_method("length", "int", &[])
            .simple_method("charAt", "char", &["int"])
            .simple_method("subSequence", "java.lang.CharSequence", &["int", "int"])
            .method(M::new("isEmpty", "boolean", &[]).modifiers(DEFAULT)),
        C::interface("java.lang.Comparable")
            .type_param("T", &[])
            .simple_method("compareTo", "int", &["T"]),
        C::interface("java.lang.Cloneable"),
        C::interface("java.lang.Runnable")
            .annotation("java.lang.FunctionalInterface")
            .simple_method("run", "void", &[]),
        C::interface("java.lang.AutoCloseable")
            .method(M::new("close", "void", &[]).throws("java.lang.Exception")),
        C::interface("java.lang.Iterable")
            .type_param("T", &[])
            .simple_method("iterator", "java.util.Iterator<T>", &[]),
        C::class("java.lang.String")
            .modifiers(PUBLIC_FINAL)
            .implements("java.io.Serializable")
            .implements("java.lang.Comparable<java.lang.String>")
            .implements("java.lang.CharSequence")
            .constructor(&[])
            .constructor(&["java.lang.String"])
            .constructor(&["char[]"])
            .simple_method("length", "int", &[])
            .simple_method("charAt", "char", &["int"])
            .simple_method("isEmpty", "boolean", &[])
            .simple_method("subSequence", "java.lang.CharSequence", &["int", "int"])
            .simple_method("substring", "java.lang.String", &["int"])
            .simple_method("substring", "java.lang.String", &["int", "int"])
            .simple_method("indexOf", "int", &["int"])
            .simple_method("indexOf", "int", &["java.lang.String"])
            .simple_method("concat", "java.lang.String", &["java.lang.String"])
            .simple_method("contains", "boolean", &["java.lang.CharSequence"])
            .simple_method("trim", "java.lang.String", &[])
            .simple_method("toUpperCase", "java.lang.String", &[])
            .simple_method("toCharArray", "char[]", &[])
            .simple_method("compareTo", "int", &["java.lang.String"])
            .method(M::new("compareTo", "int", &["java.lang.Object"]).bridge())
            .static_method("valueOf", "java.lang.String", &["java.lang.Object"])
            .static_method("valueOf", "java.lang.String", &["int"])
            .static_method("valueOf", "java.lang.String", &["long"])
            .static_method("valueOf", "java.lang.String", &["char"])
            .static_method("valueOf", "java.lang.String", &["boolean"])
            .static_method("valueOf", "java.lang.String", &["double"])
            .method(M::new("format", "java.lang.String", &["java.lang.String", "java.lang.Object..."]).modifiers(PUBLIC_STATIC))
            .method(M::new("join", "java.lang.String", &["java.lang.CharSequence", "java.lang.CharSequence..."]).modifiers(PUBLIC_STATIC)),
        C::class("java.lang.StringBuilder")
            .modifiers(PUBLIC_FINAL)
            .implements("java.io.Serializable")
            .implements("java.lang.CharSequence")
            .constructor(&[])
            .constructor(&["java.lang.String"])
            .simple_method("append", "java.lang.StringBuilder", &["java.lang.Object"])
            .simple_method("append", "java.lang.StringBuilder", &["java.lang.String"])
            .simple_method("append", "java.lang.StringBuilder", &["char"])
            .simple_method("append", "java.lang.StringBuilder", &["int"])
            .simple_method("append", "java.lang.StringBuilder", &["long"])
            .simple_method("append", "java.lang.StringBuilder", &["boolean"])
            .simple_method("append", "java.lang.StringBuilder", &["double"])
            .simple_method("length", "int", &[])
            .simple_method("charAt", "char", &["int"])
            .simple_method("subSequence", "java.lang.CharSequence", &["int", "int"])
            .simple_method("toString", "java.lang.String", &[]),
        C::class("java.lang.Math")
            .modifiers(PUBLIC_FINAL)
            .constant("PI", "double", ConstantValue::Double(std::f64::consts::PI))
            .constant("E", "double", ConstantValue::Double(std::f64::consts::E))
            .static_method("abs", "int", &["int"])
            .static_method("abs", "long", &["long"])
            .static_method("abs", "float", &["float"])
            .static_method("abs", "double", &["double"])
            .static_method("max", "int", &["int", "int"])
            .static_method("max", "long", &["long", "long"])
            .static_method("max", "float", &["float", "float"])
            .static_method("max", "double", &["double", "double"])
            .static_method("min", "int", &["int", "int"])
            .static_method("min", "long", &["long", "long"])
            .static_method("min", "double", &["double", "double"])
            .static_method("sqrt", "double", &["double"])
            .static_method("round", "long", &["double"])
            .static_method("round", "int", &["float"]),
        C::class("java.lang.System")
            .modifiers(PUBLIC_FINAL)
            .field("out", "java.io.PrintStream", PUBLIC_STATIC | ACC_FINAL)
            .field("err", "java.io.PrintStream", PUBLIC_STATIC | ACC_FINAL)
            .static_method("currentTimeMillis", "long", &[])
            .static_method("getProperty", "java.lang.String", &["java.lang.String"])
            .static_method("arraycopy", "void", &["java.lang.Object", "int", "java.lang.Object", "int", "int"]),
        C::class("java.lang.Enum")
            .modifiers(PUBLIC_ABSTRACT)
            .type_param("E", &["java.lang.Enum<E>"])
            .implements("java.lang.Comparable<E>")
            .implements("java.io.Serializable")
            .constructor_with(M::constructor(&["java.lang.String", "int"]).modifiers(ACC_PROTECTED))
            .method(M::new("name", "java.lang.String", &[]).modifiers(PUBLIC_FINAL))
            .method(M::new("ordinal", "int", &[]).modifiers(PUBLIC_FINAL))
            .method(M::new("compareTo", "int", &["E"]).modifiers(PUBLIC_FINAL))
            .method(M::new("getDeclaringClass", "java.lang.Class<E>", &[]).modifiers(PUBLIC_FINAL))
            .method(
                M::new("valueOf", "T", &["java.lang.Class<T>", "java.lang.String"])
                    .modifiers(PUBLIC_STATIC)
                    .type_param("T", &["java.lang.Enum<T>"]),
            ),
        C::class("java.lang.Record")
            .modifiers(PUBLIC_ABSTRACT)
            .constructor_with(M::constructor(&[]).modifiers(ACC_PROTECTED)),
        C::class("java.lang.Void").modifiers(PUBLIC_FINAL),
        C::interface("java.lang.annotation.Annotation")
            .simple_method("annotationType", "java.lang.Class<? extends java.lang.annotation.Annotation>", &[]),
        C::annotation_type("java.lang.Override"),
        C::annotation_type("java.lang.Deprecated")
            .element("since", "java.lang.String", true)
            .element("forRemoval", "boolean", true),
        C::annotation_type("java.lang.FunctionalInterface"),
        C::annotation_type("java.lang.SuppressWarnings").element("value", "java.lang.String[]", false),
    ]
}

/// `java.lang.Number` and the eight wrapper classes.
fn boxes() -> Vec<C> {
    let number = C::class("java.lang.Number")
        .modifiers(PUBLIC_ABSTRACT)
        .implements("java.io.Serializable")
        .constructor(&[])
        .simple_method("byteValue", "byte", &[])
        .simple_method("shortValue", "short", &[])
        .method(M::new("intValue", "int", &[]).modifiers(PUBLIC_ABSTRACT))
        .method(M::new("longValue", "long", &[]).modifiers(PUBLIC_ABSTRACT))
        .method(M::new("floatValue", "float", &[]).modifiers(PUBLIC_ABSTRACT))
        .method(M::new("doubleValue", "double", &[]).modifiers(PUBLIC_ABSTRACT));

    let numeric = |name: &str, prim: &str, min: ConstantValue, max: ConstantValue| {
        let me = format!("java.lang.{name}");
        C::class(&me)
            .modifiers(PUBLIC_FINAL)
            .superclass(Some("java.lang.Number"))
            .implements(&format!("java.lang.Comparable<{me}>"))
            .constant("MIN_VALUE", prim, min)
            .constant("MAX_VALUE", prim, max)
            .constructor(&[prim])
            .static_method("valueOf", &me, &[prim])
            .static_method("valueOf", &me, &["java.lang.String"])
            .static_method("toString", "java.lang.String", &[prim])
            .simple_method("intValue", "int", &[])
            .simple_method("longValue", "long", &[])
            .simple_method("floatValue", "float", &[])
            .simple_method("doubleValue", "double", &[])
            .simple_method("compareTo", "int", &[me.as_str()])
    };

    vec![
        number,
        numeric("Byte", "byte", ConstantValue::Byte(i8::MIN), ConstantValue::Byte(i8::MAX)),
        numeric("Short", "short", ConstantValue::Short(i16::MIN), ConstantValue::Short(i16::MAX)),
        numeric("Integer", "int", ConstantValue::Int(i32::MIN), ConstantValue::Int(i32::MAX))
            .static_method("parseInt", "int", &["java.lang.String"])
            .static_method("max", "int", &["int", "int"]),
        numeric("Long", "long", ConstantValue::Long(i64::MIN), ConstantValue::Long(i64::MAX))
            .static_method("parseLong", "long", &["java.lang.String"]),
        numeric("Float", "float", ConstantValue::Float(f32::from_bits(1)), ConstantValue::Float(f32::MAX)),
        numeric("Double", "double", ConstantValue::Double(f64::from_bits(1)), ConstantValue::Double(f64::MAX))
            .static_method("parseDouble", "double", &["java.lang.String"]),
        C::class("java.lang.Character")
            .modifiers(PUBLIC_FINAL)
            .implements("java.io.Serializable")
            .implements("java.lang.Comparable<java.lang.Character>")
            .constant("MIN_VALUE", "char", ConstantValue::Char(0))
            .constant("MAX_VALUE", "char", ConstantValue::Char(u16::MAX))
            .constructor(&["char"])
            .static_method("valueOf", "java.lang.Character", &["char"])
            .static_method("isDigit", "boolean", &["char"])
            .static_method("isLetter", "boolean", &["char"])
            .simple_method("charValue", "char", &[])
            .simple_method("compareTo", "int", &["java.lang.Character"]),
        C::class("java.lang.Boolean")
            .modifiers(PUBLIC_FINAL)
            .implements("java.io.Serializable")
            .implements("java.lang.Comparable<java.lang.Boolean>")
            .field("TRUE", "java.lang.Boolean", PUBLIC_STATIC | ACC_FINAL)
            .field("FALSE", "java.lang.Boolean", PUBLIC_STATIC | ACC_FINAL)
            .constructor(&["boolean"])
            .static_method("valueOf", "java.lang.Boolean", &["boolean"])
            .static_method("parseBoolean", "boolean", &["java.lang.String"])
            .simple_method("booleanValue", "boolean", &[])
            .simple_method("compareTo", "int", &["java.lang.Boolean"]),
    ]
}

fn throwables() -> Vec<C> {
    let exception = |name: &str, superclass: &str| {
        C::class(name)
            .superclass(Some(superclass))
            .constructor(&[])
            .constructor(&["java.lang.String"])
    };
    vec![
        C::class("java.lang.Throwable")
            .implements("java.io.Serializable")
            .constructor(&[])
            .constructor(&["java.lang.String"])
            .constructor(&["java.lang.String", "java.lang.Throwable"])
            .simple_method("getMessage", "java.lang.String", &[])
            .simple_method("getCause", "java.lang.Throwable", &[])
            .simple_method("printStackTrace", "void", &[]),
        exception("java.lang.Exception", "java.lang.Throwable"),
        exception("java.lang.Error", "java.lang.Throwable"),
        exception("java.lang.RuntimeException", "java.lang.Exception"),
        exception("java.lang.InterruptedException", "java.lang.Exception"),
        exception("java.lang.CloneNotSupportedException", "java.lang.Exception"),
        exception("java.lang.IllegalArgumentException", "java.lang.RuntimeException"),
        exception("java.lang.IllegalStateException", "java.lang.RuntimeException"),
        exception("java.lang.NullPointerException", "java.lang.RuntimeException"),
        exception("java.lang.UnsupportedOperationException", "java.lang.RuntimeException"),
        exception("java.io.IOException", "java.lang.Exception"),
    ]
}

fn java_io() -> Vec<C> {
    let mut print_stream = C::class("java.io.PrintStream")
        .constructor(&["java.io.OutputStream"])
        .simple_method("println", "void", &[])
        .simple_method("flush", "void", &[])
        .method(
            M::new("printf", "java.io.PrintStream", &["java.lang.String", "java.lang.Object..."])
                .param_names(&["format", "args"]),
        );
    for ty in [
        "boolean",
        "char",
        "int",
        "long",
        "float",
        "double",
        "char[]",
        "java.lang.String",
        "java.lang.Object",
    ] {
        print_stream = print_stream
            .method(M::new("println", "void", &[ty]).param_names(&["x"]))
            .simple_method("print", "void", &[ty]);
    }
    vec![
        C::interface("java.io.Serializable"),
        C::interface("java.io.Closeable")
            .implements("java.lang.AutoCloseable")
            .method(M::new("close", "void", &[]).throws("java.io.IOException")),
        C::class("java.io.OutputStream")
            .modifiers(PUBLIC_ABSTRACT)
            .implements("java.io.Closeable")
            .constructor(&[])
            .method(M::new("write", "void", &["int"]).modifiers(PUBLIC_ABSTRACT).throws("java.io.IOException")),
        print_stream,
    ]
}

fn java_util() -> Vec<C> {
    vec![
        C::interface("java.util.Iterator")
            .type_param("E", &[])
            .simple_method("hasNext", "boolean", &[])
            .simple_method("next", "E", &[]),
        C::interface("java.util.Collection")
            .type_param("E", &[])
            .implements("java.lang.Iterable<E>")
            .simple_method("size", "int", &[])
            .simple_method("isEmpty", "boolean", &[])
            .simple_method("contains", "boolean", &["java.lang.Object"])
            .simple_method("add", "boolean", &["E"])
            .simple_method("remove", "boolean", &["java.lang.Object"])
            .simple_method("addAll", "boolean", &["java.util.Collection<? extends E>"])
            .simple_method("toArray", "java.lang.Object[]", &[])
            .method(M::new("toArray", "T[]", &["T[]"]).type_param("T", &[]))
            .simple_method("clear", "void", &[]),
        C::interface("java.util.List")
            .type_param("E", &[])
            .implements("java.util.Collection<E>")
            .simple_method("get", "E", &["int"])
            .simple_method("set", "E", &["int", "E"])
            .simple_method("add", "boolean", &["E"])
            .simple_method("add", "void", &["int", "E"])
            .simple_method("remove", "E", &["int"])
            .simple_method("indexOf", "int", &["java.lang.Object"])
            .simple_method("subList", "java.util.List<E>", &["int", "int"])
            .method(
                M::new("of", "java.util.List<E>", &["E..."])
                    .modifiers(PUBLIC_STATIC)
                    .type_param("E", &[]),
            ),
        C::class("java.util.AbstractList")
            .modifiers(PUBLIC_ABSTRACT)
            .type_param("E", &[])
            .implements("java.util.List<E>")
            .constructor_with(M::constructor(&[]).modifiers(ACC_PROTECTED))
            .method(M::new("get", "E", &["int"]).modifiers(PUBLIC_ABSTRACT)),
        C::class("java.util.ArrayList")
            .type_param("E", &[])
            .superclass(Some("java.util.AbstractList<E>"))
            .implements("java.util.List<E>")
            .implements("java.lang.Cloneable")
            .implements("java.io.Serializable")
            .constructor(&[])
            .constructor(&["int"])
            .constructor(&["java.util.Collection<? extends E>"])
            .simple_method("get", "E", &["int"])
            .simple_method("size", "int", &[])
            .simple_method("add", "boolean", &["E"])
            .simple_method("ensureCapacity", "void", &["int"]),
        C::interface("java.util.Map")
            .type_param("K", &[])
            .type_param("V", &[])
            .member_class("java.util.Map$Entry")
            .simple_method("size", "int", &[])
            .simple_method("get", "V", &["java.lang.Object"])
            .simple_method("put", "V", &["K", "V"])
            .simple_method("containsKey", "boolean", &["java.lang.Object"])
            .simple_method("keySet", "java.util.Set<K>", &[])
            .simple_method("values", "java.util.Collection<V>", &[])
            .simple_method("entrySet", "java.util.Set<java.util.Map$Entry<K, V>>", &[])
            .method(M::new("getOrDefault", "V", &["java.lang.Object", "V"]).modifiers(DEFAULT)),
        C::interface("java.util.Map$Entry")
            .modifiers(PUBLIC_ABSTRACT | ACC_STATIC)
            .declared_in("java.util.Map")
            .type_param("K", &[])
            .type_param("V", &[])
            .simple_method("getKey", "K", &[])
            .simple_method("getValue", "V", &[]),
        C::interface("java.util.Set")
            .type_param("E", &[])
            .implements("java.util.Collection<E>"),
        C::class("java.util.HashMap")
            .type_param("K", &[])
            .type_param("V", &[])
            .implements("java.util.Map<K, V>")
            .implements("java.lang.Cloneable")
            .implements("java.io.Serializable")
            .constructor(&[])
            .constructor(&["int"])
            .simple_method("get", "V", &["java.lang.Object"])
            .simple_method("put", "V", &["K", "V"]),
        C::class("java.util.Arrays")
            .method(
                M::new("asList", "java.util.List<T>", &["T..."])
                    .modifiers(PUBLIC_STATIC)
                    .type_param("T", &[])
                    .param_names(&["a"]),
            )
            .static_method("toString", "java.lang.String", &["int[]"])
            .static_method("toString", "java.lang.String", &["java.lang.Object[]"])
            .static_method("sort", "void", &["int[]"]),
        C::class("java.util.Collections")
            .method(
                M::new("emptyList", "java.util.List<T>", &[])
                    .modifiers(PUBLIC_STATIC)
                    .type_param("T", &[]),
            )
            .method(
                M::new("singletonList", "java.util.List<T>", &["T"])
                    .modifiers(PUBLIC_STATIC)
                    .type_param("T", &[]),
            )
            .method(
                M::new("max", "T", &["java.util.Collection<? extends T>"])
                    .modifiers(PUBLIC_STATIC)
                    .type_param("T", &["java.lang.Object", "java.lang.Comparable<? super T>"]),
            ),
        C::class("java.util.Objects")
            .modifiers(PUBLIC_FINAL)
            .static_method("equals", "boolean", &["java.lang.Object", "java.lang.Object"])
            .static_method("hashCode", "int", &["java.lang.Object"])
            .method(
                M::new("requireNonNull", "T", &["T"])
                    .modifiers(PUBLIC_STATIC)
                    .type_param("T", &[]),
            ),
        C::class("java.util.Optional")
            .modifiers(PUBLIC_FINAL)
            .type_param("T", &[])
            .method(
                M::new("of", "java.util.Optional<T>", &["T"])
                    .modifiers(PUBLIC_STATIC)
                    .type_param("T", &[]),
            )
            .method(
                M::new("empty", "java.util.Optional<T>", &[])
                    .modifiers(PUBLIC_STATIC)
                    .type_param("T", &[]),
            )
            .simple_method("get", "T", &[])
            .simple_method("isPresent", "boolean", &[])
            .simple_method("orElse", "T", &["T"]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_bootstrap_class_builds() {
        let built = classes();
        for class in &built {
            assert!(class.is_ok(), "{class:?}");
        }
        assert!(built.len() > 50);
    }
}
