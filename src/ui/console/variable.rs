use crate::debugger::rpc::api::Variable;

const TAB: &str = "\t";

/// Variable kinds as reported by backend.
mod kind {
    pub const ARRAY: u32 = 17;
    pub const CHAN: u32 = 18;
    pub const FUNC: u32 = 19;
    pub const INTERFACE: u32 = 20;
    pub const MAP: u32 = 21;
    pub const PTR: u32 = 22;
    pub const SLICE: u32 = 23;
    pub const STRING: u32 = 24;
    pub const STRUCT: u32 = 25;
    pub const UNSAFE_POINTER: u32 = 26;
    pub const COMPLEX64: u32 = 15;
    pub const COMPLEX128: u32 = 16;
}

#[derive(Clone, Copy)]
struct Layout<'a> {
    multiline: bool,
    indent: &'a str,
}

/// Render variable value on a single line.
pub fn render_variable_singleline(var: &Variable) -> String {
    let mut buf = String::new();
    write_variable(
        &mut buf,
        var,
        true,
        true,
        Layout {
            multiline: false,
            indent: "",
        },
    );
    buf
}

/// Render variable value, composite values are rendered with one member per line.
pub fn render_variable(var: &Variable, indent: &str) -> String {
    let mut buf = String::new();
    write_variable(
        &mut buf,
        var,
        true,
        true,
        Layout {
            multiline: true,
            indent,
        },
    );
    buf
}

fn write_variable(buf: &mut String, var: &Variable, top: bool, include_type: bool, layout: Layout) {
    if !var.unreadable.is_empty() {
        buf.push_str(&format!("(unreadable {})", var.unreadable));
        return;
    }

    match var.kind {
        kind::SLICE => {
            if top {
                buf.push_str(&format!("{} len: {}, cap: {}, ", var.type_name, var.len, var.cap));
            }
            if var.addr == 0 && var.len == 0 {
                buf.push_str("nil");
                return;
            }
            write_list(buf, var, layout);
        }
        kind::ARRAY => {
            if top {
                buf.push_str(&format!("{} ", var.type_name));
            }
            write_list(buf, var, layout);
        }
        kind::PTR => match var.children.first() {
            Some(pointee) if !var.type_name.is_empty() && pointee.addr != 0 => {
                buf.push('*');
                write_variable(buf, pointee, false, include_type, layout);
            }
            _ => buf.push_str("nil"),
        },
        kind::UNSAFE_POINTER => buf.push_str(&format!("unsafe.Pointer({})", var.value)),
        kind::STRING => write_string(buf, var),
        kind::CHAN => {
            if include_type {
                buf.push_str(&format!("{} ", var.type_name));
            }
            if var.value.is_empty() {
                buf.push_str(&format!("{{len: {}, cap: {}}}", var.len, var.cap));
            } else {
                buf.push_str(&var.value);
            }
        }
        kind::STRUCT => {
            if var.len as usize != var.children.len() && var.children.is_empty() {
                buf.push_str(&format!("(*{})({:#x})", var.type_name, var.addr));
                return;
            }
            if include_type {
                buf.push_str(&format!("{} ", var.type_name));
            }
            write_members(buf, var, '{', '}', layout, |buf, child, layout| {
                buf.push_str(&format!("{}: ", child.name));
                write_variable(buf, child, false, true, layout);
            });
        }
        kind::INTERFACE => match var.children.first() {
            None => {
                if include_type {
                    buf.push_str(&format!("{} ", var.type_name));
                }
                buf.push_str("nil");
            }
            Some(data) => {
                if include_type {
                    buf.push_str(&format!("{}({}) ", var.type_name, data.type_name));
                }
                write_variable(buf, data, false, false, layout);
            }
        },
        kind::MAP => {
            if top {
                buf.push_str(&format!("{} ", var.type_name));
            }
            write_map(buf, var, layout);
        }
        kind::FUNC if var.value.is_empty() => buf.push_str("nil"),
        kind::COMPLEX64 | kind::COMPLEX128 => buf.push_str(&format!("({})", var.value)),
        _ if var.value.is_empty() => buf.push_str(&format!("(unknown {})", var.type_name)),
        _ => buf.push_str(&var.value),
    }
}

fn write_string(buf: &mut String, var: &Variable) {
    buf.push_str(&format!("{:?}", var.value));
    let loaded = var.value.chars().count() as i64;
    if var.len > loaded {
        buf.push_str(&format!("...+{} more", var.len - loaded));
    }
}

fn write_list(buf: &mut String, var: &Variable, layout: Layout) {
    write_members(buf, var, '[', ']', layout, |buf, child, layout| {
        write_variable(buf, child, false, false, layout);
    });
}

fn write_map(buf: &mut String, var: &Variable, layout: Layout) {
    let nested_indent = format!("{}{TAB}", layout.indent);
    let nested = Layout {
        multiline: layout.multiline,
        indent: &nested_indent,
    };

    buf.push('[');
    let pairs = var.children.chunks(2);
    let pairs_count = pairs.len();
    for (i, pair) in pairs.enumerate() {
        if layout.multiline {
            buf.push_str(&format!("\n{nested_indent}"));
        }
        if let [key, value] = pair {
            write_variable(buf, key, false, false, nested);
            buf.push_str(": ");
            write_variable(buf, value, false, false, nested);
        }
        if i + 1 != pairs_count || layout.multiline {
            buf.push(',');
            if !layout.multiline {
                buf.push(' ');
            }
        }
    }
    write_rest(buf, var.len - pairs_count as i64, layout, &nested_indent);
    if layout.multiline && pairs_count > 0 {
        buf.push_str(&format!("\n{}", layout.indent));
    }
    buf.push(']');
}

fn write_members<F>(buf: &mut String, var: &Variable, open: char, close: char, layout: Layout, write: F)
where
    F: Fn(&mut String, &Variable, Layout),
{
    let nested_indent = format!("{}{TAB}", layout.indent);
    let nested = Layout {
        multiline: layout.multiline,
        indent: &nested_indent,
    };

    buf.push(open);
    for (i, child) in var.children.iter().enumerate() {
        if layout.multiline {
            buf.push_str(&format!("\n{nested_indent}"));
        }
        write(buf, child, nested);
        if i + 1 != var.children.len() || layout.multiline {
            buf.push(',');
            if !layout.multiline {
                buf.push(' ');
            }
        }
    }
    write_rest(buf, var.len - var.children.len() as i64, layout, &nested_indent);
    if layout.multiline && !var.children.is_empty() {
        buf.push_str(&format!("\n{}", layout.indent));
    }
    buf.push(close);
}

/// Write a mark of not loaded members.
fn write_rest(buf: &mut String, rest: i64, layout: Layout, indent: &str) {
    if rest <= 0 {
        return;
    }
    if layout.multiline {
        buf.push_str(&format!("\n{indent}...+{rest} more"));
    } else {
        buf.push_str(&format!(", ...+{rest} more"));
    }
}
