//! The standard host surface: a deliberately narrow set of namespaces
//! registered on the bridge. Every entry is a pre-wrapped adapter that
//! unmarshals its own arguments and marshals its result back.

use std::{
    env, fs,
    path::Path,
    rc::Rc,
    thread,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use indexmap::IndexMap;

use crate::{
    bridge::{expect_array, expect_int, expect_map, expect_number, expect_str, host_failure, HostRegistry},
    diagnostics::Result,
    value::{MapKey, Value, ValueKind, VARIADIC},
};

/// Build the registry every default interpreter shares.
pub fn standard_registry() -> HostRegistry {
    let mut registry = HostRegistry::new();

    registry.register_functions(
        "fmt",
        &[
            ("print", VARIADIC, fmt_print),
            ("println", VARIADIC, fmt_println),
            ("sprint", VARIADIC, fmt_sprint),
        ],
    );

    registry.register_functions("rt", &[("cast", 2, rt_cast), ("type_of", 1, rt_type_of)]);

    registry.register_functions(
        "os",
        &[
            ("getenv", 1, os_getenv),
            ("setenv", 2, os_setenv),
            ("environ", 0, os_environ),
        ],
    );
    registry.register_constants(
        "os",
        vec![(
            "args",
            Value::array(env::args().map(Value::string).collect()),
        )],
    );

    registry.register_constants(
        "sys",
        vec![
            ("os", Value::string(env::consts::OS)),
            ("arch", Value::string(env::consts::ARCH)),
            ("family", Value::string(env::consts::FAMILY)),
        ],
    );

    registry.register_functions(
        "time",
        &[
            ("now", 0, time_now),
            ("sleep", 1, time_sleep),
            ("since", 1, time_since),
        ],
    );
    registry.register_constants(
        "time",
        vec![("unix_epoch", Value::host("SystemTime", Rc::new(UNIX_EPOCH)))],
    );

    registry.register_functions(
        "math",
        &[
            ("abs", 1, math_abs),
            ("floor", 1, math_floor),
            ("ceil", 1, math_ceil),
            ("round", 1, math_round),
            ("sqrt", 1, math_sqrt),
            ("pow", 2, math_pow),
        ],
    );
    registry.register_constants(
        "math",
        vec![
            ("pi", Value::float(std::f64::consts::PI)),
            ("e", Value::float(std::f64::consts::E)),
        ],
    );

    registry.register_functions(
        "strings",
        &[
            ("len", 1, strings_len),
            ("contains", 2, strings_contains),
            ("to_upper", 1, strings_to_upper),
            ("to_lower", 1, strings_to_lower),
            ("trim", 1, strings_trim),
            ("split", 2, strings_split),
            ("join", 2, strings_join),
        ],
    );

    registry.register_functions(
        "collections",
        &[
            ("len", 1, collections_len),
            ("push", 2, collections_push),
            ("pop", 1, collections_pop),
            ("keys", 1, collections_keys),
            ("values", 1, collections_values),
            ("range", 2, collections_range),
        ],
    );

    registry.register_functions(
        "fs",
        &[
            ("read_text", 1, fs_read_text),
            ("write_text", 2, fs_write_text),
            ("exists", 1, fs_exists),
        ],
    );

    registry
}

fn fmt_print(args: &[Value]) -> Result<Value> {
    for (idx, arg) in args.iter().enumerate() {
        if idx > 0 {
            print!(" ");
        }
        print!("{arg}");
    }
    Ok(Value::null())
}

fn fmt_println(args: &[Value]) -> Result<Value> {
    fmt_print(args)?;
    println!();
    Ok(Value::null())
}

fn fmt_sprint(args: &[Value]) -> Result<Value> {
    let mut output = String::new();
    for (idx, arg) in args.iter().enumerate() {
        if idx > 0 {
            output.push(' ');
        }
        output.push_str(&arg.to_string());
    }
    Ok(Value::string(output))
}

/// The dedicated explicit-conversion operation: `rt.cast(value, "Int")`.
fn rt_cast(args: &[Value]) -> Result<Value> {
    let target = expect_str(&args[1], "rt.cast")?;
    let value = &args[0];
    match target {
        "Int" => match &*value.0 {
            ValueKind::Int(n) => Ok(Value::int(*n)),
            ValueKind::Float(f) => Ok(Value::int(*f as i64)),
            ValueKind::Bool(b) => Ok(Value::int(i64::from(*b))),
            ValueKind::String(s) => s
                .trim()
                .parse()
                .map(Value::int)
                .map_err(|err| host_failure("rt.cast", format!("cannot cast `{s}` to Int: {err}"))),
            _ => Err(host_failure(
                "rt.cast",
                format!("cannot cast {} to Int", value.type_name()),
            )),
        },
        "Float" => match &*value.0 {
            ValueKind::Int(n) => Ok(Value::float(*n as f64)),
            ValueKind::Float(f) => Ok(Value::float(*f)),
            ValueKind::String(s) => s.trim().parse().map(Value::float).map_err(|err| {
                host_failure("rt.cast", format!("cannot cast `{s}` to Float: {err}"))
            }),
            _ => Err(host_failure(
                "rt.cast",
                format!("cannot cast {} to Float", value.type_name()),
            )),
        },
        "String" => Ok(Value::string(value.to_string())),
        "Bool" => Ok(Value::bool(value.is_truthy())),
        other => Err(host_failure(
            "rt.cast",
            format!("unknown target type `{other}`"),
        )),
    }
}

fn rt_type_of(args: &[Value]) -> Result<Value> {
    Ok(Value::string(args[0].type_name()))
}

fn os_getenv(args: &[Value]) -> Result<Value> {
    let name = expect_str(&args[0], "os.getenv")?;
    match env::var(name) {
        Ok(value) => Ok(Value::string(value)),
        Err(_) => Ok(Value::null()),
    }
}

fn os_setenv(args: &[Value]) -> Result<Value> {
    let name = expect_str(&args[0], "os.setenv")?;
    let value = expect_str(&args[1], "os.setenv")?;
    env::set_var(name, value);
    Ok(Value::null())
}

fn os_environ(_: &[Value]) -> Result<Value> {
    let mut map = IndexMap::new();
    for (key, value) in env::vars() {
        map.insert(MapKey::String(key), Value::string(value));
    }
    Ok(Value::map(map))
}

fn time_now(_: &[Value]) -> Result<Value> {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(duration) => Ok(Value::float(duration.as_secs_f64())),
        Err(err) => Err(host_failure("time.now", err)),
    }
}

fn time_sleep(args: &[Value]) -> Result<Value> {
    let millis = expect_number(&args[0], "time.sleep")?;
    if millis < 0.0 {
        return Err(host_failure("time.sleep", "duration must be non-negative"));
    }
    thread::sleep(Duration::from_secs_f64(millis / 1000.0));
    Ok(Value::null())
}

fn time_since(args: &[Value]) -> Result<Value> {
    let instant = match &*args[0].0 {
        ValueKind::Host(host) => host.downcast::<SystemTime>().ok_or_else(|| {
            host_failure("time.since", format!("expected SystemTime, found {}", host.tag))
        })?,
        _ => {
            return Err(host_failure(
                "time.since",
                format!("expected Host value, found {}", args[0].type_name()),
            ));
        }
    };
    match instant.elapsed() {
        Ok(duration) => Ok(Value::float(duration.as_secs_f64())),
        Err(err) => Err(host_failure("time.since", err)),
    }
}

fn math_abs(args: &[Value]) -> Result<Value> {
    let number = expect_number(&args[0], "math.abs")?;
    if args[0].is_int() {
        Ok(Value::int(number.abs() as i64))
    } else {
        Ok(Value::float(number.abs()))
    }
}

fn math_floor(args: &[Value]) -> Result<Value> {
    let number = expect_number(&args[0], "math.floor")?;
    Ok(Value::float(number.floor()))
}

fn math_ceil(args: &[Value]) -> Result<Value> {
    let number = expect_number(&args[0], "math.ceil")?;
    Ok(Value::float(number.ceil()))
}

fn math_round(args: &[Value]) -> Result<Value> {
    let number = expect_number(&args[0], "math.round")?;
    Ok(Value::float(number.round()))
}

fn math_sqrt(args: &[Value]) -> Result<Value> {
    let number = expect_number(&args[0], "math.sqrt")?;
    if number < 0.0 {
        return Err(host_failure("math.sqrt", "negative input"));
    }
    Ok(Value::float(number.sqrt()))
}

fn math_pow(args: &[Value]) -> Result<Value> {
    let base = expect_number(&args[0], "math.pow")?;
    let exponent = expect_number(&args[1], "math.pow")?;
    Ok(Value::float(base.powf(exponent)))
}

fn strings_len(args: &[Value]) -> Result<Value> {
    let text = expect_str(&args[0], "strings.len")?;
    Ok(Value::int(text.chars().count() as i64))
}

fn strings_contains(args: &[Value]) -> Result<Value> {
    let text = expect_str(&args[0], "strings.contains")?;
    let needle = expect_str(&args[1], "strings.contains")?;
    Ok(Value::bool(text.contains(needle)))
}

fn strings_to_upper(args: &[Value]) -> Result<Value> {
    let text = expect_str(&args[0], "strings.to_upper")?;
    Ok(Value::string(text.to_uppercase()))
}

fn strings_to_lower(args: &[Value]) -> Result<Value> {
    let text = expect_str(&args[0], "strings.to_lower")?;
    Ok(Value::string(text.to_lowercase()))
}

fn strings_trim(args: &[Value]) -> Result<Value> {
    let text = expect_str(&args[0], "strings.trim")?;
    Ok(Value::string(text.trim()))
}

fn strings_split(args: &[Value]) -> Result<Value> {
    let text = expect_str(&args[0], "strings.split")?;
    let separator = expect_str(&args[1], "strings.split")?;
    if separator.is_empty() {
        return Err(host_failure("strings.split", "separator must not be empty"));
    }
    let parts = text.split(separator).map(Value::string).collect();
    Ok(Value::array(parts))
}

fn strings_join(args: &[Value]) -> Result<Value> {
    let items = expect_array(&args[0], "strings.join")?;
    let separator = expect_str(&args[1], "strings.join")?;
    let mut output = String::new();
    for (idx, item) in items.iter().enumerate() {
        let piece = expect_str(item, "strings.join")?;
        if idx > 0 {
            output.push_str(separator);
        }
        output.push_str(piece);
    }
    Ok(Value::string(output))
}

fn collections_len(args: &[Value]) -> Result<Value> {
    let len = match &*args[0].0 {
        ValueKind::String(s) => s.chars().count(),
        ValueKind::Array(values) => values.len(),
        ValueKind::Map(map) => map.len(),
        _ => {
            return Err(host_failure(
                "collections.len",
                format!("expected String, Array, or Map, found {}", args[0].type_name()),
            ));
        }
    };
    Ok(Value::int(len as i64))
}

fn collections_push(args: &[Value]) -> Result<Value> {
    let values = expect_array(&args[0], "collections.push")?;
    let mut new = values.to_vec();
    new.push(args[1].clone());
    Ok(Value::array(new))
}

fn collections_pop(args: &[Value]) -> Result<Value> {
    let values = expect_array(&args[0], "collections.pop")?;
    let mut new = values.to_vec();
    let Some(value) = new.pop() else {
        return Err(host_failure("collections.pop", "array is empty"));
    };
    let mut result = IndexMap::new();
    result.insert(MapKey::String("value".into()), value);
    result.insert(MapKey::String("array".into()), Value::array(new));
    Ok(Value::map(result))
}

fn collections_keys(args: &[Value]) -> Result<Value> {
    let map = expect_map(&args[0], "collections.keys")?;
    let keys = map.keys().map(MapKey::to_value).collect();
    Ok(Value::array(keys))
}

fn collections_values(args: &[Value]) -> Result<Value> {
    let map = expect_map(&args[0], "collections.values")?;
    Ok(Value::array(map.values().cloned().collect()))
}

fn collections_range(args: &[Value]) -> Result<Value> {
    let start = expect_int(&args[0], "collections.range")?;
    let end = expect_int(&args[1], "collections.range")?;
    let step = if start <= end { 1 } else { -1 };
    let mut values = Vec::new();
    let mut current = start;
    while current != end {
        values.push(Value::int(current));
        current += step;
    }
    Ok(Value::array(values))
}

fn fs_read_text(args: &[Value]) -> Result<Value> {
    let path = expect_str(&args[0], "fs.read_text")?;
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Value::string(contents)),
        Err(err) => Err(host_failure("fs.read_text", format!("`{path}`: {err}"))),
    }
}

fn fs_write_text(args: &[Value]) -> Result<Value> {
    let path = expect_str(&args[0], "fs.write_text")?;
    let contents = expect_str(&args[1], "fs.write_text")?;
    match fs::write(path, contents) {
        Ok(()) => Ok(Value::null()),
        Err(err) => Err(host_failure("fs.write_text", format!("`{path}`: {err}"))),
    }
}

fn fs_exists(args: &[Value]) -> Result<Value> {
    let path = expect_str(&args[0], "fs.exists")?;
    Ok(Value::bool(Path::new(path).exists()))
}
