//! The builtin registry.
//!
//! A closed set of primitives the VM calls by identifier. `call` is the
//! single dispatch entry point: it routes to the per-concern modules, every
//! one of which validates argument count and variants before touching its
//! arguments. The name table is the compile-time surface; the compiler
//! resolves guest call sites against it and ships `BuiltinId`s in the
//! bytecode.

use crate::error::BuiltinResult;
use crate::runtime::Runtime;
use crate::{
    arithmetic, crypto, encoding, file, float_ops, io, json, list_ops, map_ops, os, random,
    regex_ops, string_ops, thread_ops,
};
use bp_core::Value;

/// Identifier of one builtin. The numbering is private to the build; names
/// are the stable surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinId {
    // I/O
    Print,
    ReadLine,
    ToStr,
    // Strings
    StrUpper,
    StrLower,
    StrTrim,
    StartsWith,
    EndsWith,
    StrFind,
    StrReplace,
    StrReverse,
    StrRepeat,
    PadLeft,
    PadRight,
    StrContains,
    StrCount,
    CharAt,
    IndexOf,
    Chr,
    Ord,
    IntToHex,
    HexToInt,
    SplitStr,
    JoinArr,
    ConcatAll,
    StrFromChars,
    StrBytes,
    StrLen,
    Substr,
    StrConcat,
    // Integer math and bitwise
    Abs,
    Min,
    Max,
    Pow,
    Sqrt,
    Floor,
    Ceil,
    Round,
    Clamp,
    Sign,
    BitAnd,
    BitOr,
    BitXor,
    BitNot,
    Shl,
    Shr,
    // Floats
    Fsin,
    Fcos,
    Ftan,
    Fatan,
    Fatan2,
    Fsqrt,
    Fpow,
    Flog,
    Flog10,
    Fexp,
    Fabs,
    Ffloor,
    Fceil,
    Fround,
    Fmin,
    Fmax,
    IntToFloat,
    FloatToInt,
    IsNan,
    IsInf,
    // Random
    Rand,
    RandSeed,
    RandRange,
    RandomBytes,
    // Files
    FileRead,
    FileWrite,
    FileAppend,
    FileExists,
    FileDelete,
    FileSize,
    FileCopy,
    FileReadBytes,
    FileWriteBytes,
    // Regex
    RegexMatch,
    RegexSearch,
    RegexReplace,
    RegexSplit,
    RegexFindAll,
    // JSON
    JsonParse,
    JsonStringify,
    // Bytes codec
    BytesNew,
    BytesGet,
    BytesSet,
    BytesLen,
    BytesAppend,
    BytesWriteU16,
    BytesWriteU32,
    BytesWriteI64,
    BytesReadU16,
    BytesReadU32,
    BytesReadI64,
    IntToBytes,
    IntFromBytes,
    Base64Encode,
    Base64Decode,
    // Security primitives
    Sha256,
    Md5,
    SecureCompare,
    // Threading
    ThreadCurrent,
    ThreadYield,
    ThreadSleep,
    ThreadSpawn,
    ThreadJoin,
    ThreadDetach,
    MutexNew,
    MutexLock,
    MutexTrylock,
    MutexUnlock,
    CondNew,
    CondWait,
    CondSignal,
    CondBroadcast,
    // Arrays
    ArrayNew,
    ArrayLen,
    ArrayPush,
    ArrayPop,
    ArrayGet,
    ArraySet,
    ArrayInsert,
    ArrayRemove,
    ArraySlice,
    ArraySort,
    ArrayConcat,
    ArrayCopy,
    ArrayClear,
    ArrayIndexOf,
    ArrayContains,
    ArrayReverse,
    ArrayFill,
    // Maps
    MapNew,
    MapLen,
    MapGet,
    MapSet,
    MapHasKey,
    MapDelete,
    MapKeys,
    MapValues,
    // Process and reflection
    Typeof,
    Tag,
    Argv,
    Argc,
    Getenv,
    ClockMs,
    Exit,
    Sleep,
    ParseInt,
    ParseFloat,
}

/// Guest-visible name of every builtin.
pub const BUILTINS: &[(&str, BuiltinId)] = &[
    ("print", BuiltinId::Print),
    ("read_line", BuiltinId::ReadLine),
    ("to_str", BuiltinId::ToStr),
    ("str_upper", BuiltinId::StrUpper),
    ("str_lower", BuiltinId::StrLower),
    ("str_trim", BuiltinId::StrTrim),
    ("starts_with", BuiltinId::StartsWith),
    ("ends_with", BuiltinId::EndsWith),
    ("str_find", BuiltinId::StrFind),
    ("str_replace", BuiltinId::StrReplace),
    ("str_reverse", BuiltinId::StrReverse),
    ("str_repeat", BuiltinId::StrRepeat),
    ("pad_left", BuiltinId::PadLeft),
    ("pad_right", BuiltinId::PadRight),
    ("str_contains", BuiltinId::StrContains),
    ("str_count", BuiltinId::StrCount),
    ("char_at", BuiltinId::CharAt),
    ("index_of", BuiltinId::IndexOf),
    ("chr", BuiltinId::Chr),
    ("ord", BuiltinId::Ord),
    ("int_to_hex", BuiltinId::IntToHex),
    ("hex_to_int", BuiltinId::HexToInt),
    ("split_str", BuiltinId::SplitStr),
    ("join_arr", BuiltinId::JoinArr),
    ("concat_all", BuiltinId::ConcatAll),
    ("str_from_chars", BuiltinId::StrFromChars),
    ("str_bytes", BuiltinId::StrBytes),
    ("str_len", BuiltinId::StrLen),
    ("substr", BuiltinId::Substr),
    ("str_concat", BuiltinId::StrConcat),
    ("abs", BuiltinId::Abs),
    ("min", BuiltinId::Min),
    ("max", BuiltinId::Max),
    ("pow", BuiltinId::Pow),
    ("sqrt", BuiltinId::Sqrt),
    ("floor", BuiltinId::Floor),
    ("ceil", BuiltinId::Ceil),
    ("round", BuiltinId::Round),
    ("clamp", BuiltinId::Clamp),
    ("sign", BuiltinId::Sign),
    ("bit_and", BuiltinId::BitAnd),
    ("bit_or", BuiltinId::BitOr),
    ("bit_xor", BuiltinId::BitXor),
    ("bit_not", BuiltinId::BitNot),
    ("shl", BuiltinId::Shl),
    ("shr", BuiltinId::Shr),
    ("fsin", BuiltinId::Fsin),
    ("fcos", BuiltinId::Fcos),
    ("ftan", BuiltinId::Ftan),
    ("fatan", BuiltinId::Fatan),
    ("fatan2", BuiltinId::Fatan2),
    ("fsqrt", BuiltinId::Fsqrt),
    ("fpow", BuiltinId::Fpow),
    ("flog", BuiltinId::Flog),
    ("flog10", BuiltinId::Flog10),
    ("fexp", BuiltinId::Fexp),
    ("fabs", BuiltinId::Fabs),
    ("ffloor", BuiltinId::Ffloor),
    ("fceil", BuiltinId::Fceil),
    ("fround", BuiltinId::Fround),
    ("fmin", BuiltinId::Fmin),
    ("fmax", BuiltinId::Fmax),
    ("int_to_float", BuiltinId::IntToFloat),
    ("float_to_int", BuiltinId::FloatToInt),
    ("is_nan", BuiltinId::IsNan),
    ("is_inf", BuiltinId::IsInf),
    ("rand", BuiltinId::Rand),
    ("rand_seed", BuiltinId::RandSeed),
    ("rand_range", BuiltinId::RandRange),
    ("random_bytes", BuiltinId::RandomBytes),
    ("file_read", BuiltinId::FileRead),
    ("file_write", BuiltinId::FileWrite),
    ("file_append", BuiltinId::FileAppend),
    ("file_exists", BuiltinId::FileExists),
    ("file_delete", BuiltinId::FileDelete),
    ("file_size", BuiltinId::FileSize),
    ("file_copy", BuiltinId::FileCopy),
    ("file_read_bytes", BuiltinId::FileReadBytes),
    ("file_write_bytes", BuiltinId::FileWriteBytes),
    ("regex_match", BuiltinId::RegexMatch),
    ("regex_search", BuiltinId::RegexSearch),
    ("regex_replace", BuiltinId::RegexReplace),
    ("regex_split", BuiltinId::RegexSplit),
    ("regex_find_all", BuiltinId::RegexFindAll),
    ("json_parse", BuiltinId::JsonParse),
    ("json_stringify", BuiltinId::JsonStringify),
    ("bytes_new", BuiltinId::BytesNew),
    ("bytes_get", BuiltinId::BytesGet),
    ("bytes_set", BuiltinId::BytesSet),
    ("bytes_len", BuiltinId::BytesLen),
    ("bytes_append", BuiltinId::BytesAppend),
    ("bytes_write_u16", BuiltinId::BytesWriteU16),
    ("bytes_write_u32", BuiltinId::BytesWriteU32),
    ("bytes_write_i64", BuiltinId::BytesWriteI64),
    ("bytes_read_u16", BuiltinId::BytesReadU16),
    ("bytes_read_u32", BuiltinId::BytesReadU32),
    ("bytes_read_i64", BuiltinId::BytesReadI64),
    ("int_to_bytes", BuiltinId::IntToBytes),
    ("int_from_bytes", BuiltinId::IntFromBytes),
    ("base64_encode", BuiltinId::Base64Encode),
    ("base64_decode", BuiltinId::Base64Decode),
    ("sha256", BuiltinId::Sha256),
    ("md5", BuiltinId::Md5),
    ("secure_compare", BuiltinId::SecureCompare),
    ("thread_current", BuiltinId::ThreadCurrent),
    ("thread_yield", BuiltinId::ThreadYield),
    ("thread_sleep", BuiltinId::ThreadSleep),
    ("thread_spawn", BuiltinId::ThreadSpawn),
    ("thread_join", BuiltinId::ThreadJoin),
    ("thread_detach", BuiltinId::ThreadDetach),
    ("mutex_new", BuiltinId::MutexNew),
    ("mutex_lock", BuiltinId::MutexLock),
    ("mutex_trylock", BuiltinId::MutexTrylock),
    ("mutex_unlock", BuiltinId::MutexUnlock),
    ("cond_new", BuiltinId::CondNew),
    ("cond_wait", BuiltinId::CondWait),
    ("cond_signal", BuiltinId::CondSignal),
    ("cond_broadcast", BuiltinId::CondBroadcast),
    ("array_new", BuiltinId::ArrayNew),
    ("array_len", BuiltinId::ArrayLen),
    ("array_push", BuiltinId::ArrayPush),
    ("array_pop", BuiltinId::ArrayPop),
    ("array_get", BuiltinId::ArrayGet),
    ("array_set", BuiltinId::ArraySet),
    ("array_insert", BuiltinId::ArrayInsert),
    ("array_remove", BuiltinId::ArrayRemove),
    ("array_slice", BuiltinId::ArraySlice),
    ("array_sort", BuiltinId::ArraySort),
    ("array_concat", BuiltinId::ArrayConcat),
    ("array_copy", BuiltinId::ArrayCopy),
    ("array_clear", BuiltinId::ArrayClear),
    ("array_index_of", BuiltinId::ArrayIndexOf),
    ("array_contains", BuiltinId::ArrayContains),
    ("array_reverse", BuiltinId::ArrayReverse),
    ("array_fill", BuiltinId::ArrayFill),
    ("map_new", BuiltinId::MapNew),
    ("map_len", BuiltinId::MapLen),
    ("map_get", BuiltinId::MapGet),
    ("map_set", BuiltinId::MapSet),
    ("map_has_key", BuiltinId::MapHasKey),
    ("map_delete", BuiltinId::MapDelete),
    ("map_keys", BuiltinId::MapKeys),
    ("map_values", BuiltinId::MapValues),
    ("typeof", BuiltinId::Typeof),
    ("tag", BuiltinId::Tag),
    ("argv", BuiltinId::Argv),
    ("argc", BuiltinId::Argc),
    ("getenv", BuiltinId::Getenv),
    ("clock_ms", BuiltinId::ClockMs),
    ("exit", BuiltinId::Exit),
    ("sleep", BuiltinId::Sleep),
    ("parse_int", BuiltinId::ParseInt),
    ("parse_float", BuiltinId::ParseFloat),
];

impl BuiltinId {
    pub fn from_name(name: &str) -> Option<BuiltinId> {
        BUILTINS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, id)| *id)
    }

    pub fn name(self) -> &'static str {
        BUILTINS
            .iter()
            .find(|(_, id)| *id == self)
            .map(|(n, _)| *n)
            .expect("every BuiltinId has a table entry")
    }
}

/// Single dispatch entry point. The runtime carries the handle table, LCG
/// state, argv and the pending-exit flag; a fatal error maps to stderr plus
/// exit status 1 in the driver.
pub fn call(rt: &mut Runtime, id: BuiltinId, args: &[Value]) -> BuiltinResult {
    use BuiltinId::*;
    match id {
        Print => io::print(args),
        ReadLine => io::read_line(args),
        ToStr => io::to_str(args),

        StrUpper => string_ops::upper(args),
        StrLower => string_ops::lower(args),
        StrTrim => string_ops::trim(args),
        StartsWith => string_ops::starts_with(args),
        EndsWith => string_ops::ends_with(args),
        StrFind => string_ops::find(args),
        StrReplace => string_ops::replace(args),
        StrReverse => string_ops::reverse(args),
        StrRepeat => string_ops::repeat(args),
        PadLeft => string_ops::pad_left(args),
        PadRight => string_ops::pad_right(args),
        StrContains => string_ops::contains(args),
        StrCount => string_ops::count(args),
        CharAt => string_ops::char_at(args),
        IndexOf => string_ops::index_of(args),
        Chr => string_ops::chr(args),
        Ord => string_ops::ord(args),
        IntToHex => string_ops::int_to_hex(args),
        HexToInt => string_ops::hex_to_int(args),
        SplitStr => string_ops::split_str(args),
        JoinArr => string_ops::join_arr(args),
        ConcatAll => string_ops::concat_all(args),
        StrFromChars => string_ops::str_from_chars(args),
        StrBytes => string_ops::str_bytes(args),
        StrLen => string_ops::str_len(args),
        Substr => string_ops::substr(args),
        StrConcat => io::str_concat(args),

        Abs => arithmetic::abs(args),
        Min => arithmetic::min(args),
        Max => arithmetic::max(args),
        Pow => arithmetic::pow(args),
        Sqrt => arithmetic::sqrt(args),
        Floor => arithmetic::floor(args),
        Ceil => arithmetic::ceil(args),
        Round => arithmetic::round(args),
        Clamp => arithmetic::clamp(args),
        Sign => arithmetic::sign(args),
        BitAnd => arithmetic::bit_and(args),
        BitOr => arithmetic::bit_or(args),
        BitXor => arithmetic::bit_xor(args),
        BitNot => arithmetic::bit_not(args),
        Shl => arithmetic::shl(args),
        Shr => arithmetic::shr(args),

        Fsin => float_ops::fsin(args),
        Fcos => float_ops::fcos(args),
        Ftan => float_ops::ftan(args),
        Fatan => float_ops::fatan(args),
        Fatan2 => float_ops::fatan2(args),
        Fsqrt => float_ops::fsqrt(args),
        Fpow => float_ops::fpow(args),
        Flog => float_ops::flog(args),
        Flog10 => float_ops::flog10(args),
        Fexp => float_ops::fexp(args),
        Fabs => float_ops::fabs(args),
        Ffloor => float_ops::ffloor(args),
        Fceil => float_ops::fceil(args),
        Fround => float_ops::fround(args),
        Fmin => float_ops::fmin(args),
        Fmax => float_ops::fmax(args),
        IntToFloat => float_ops::int_to_float(args),
        FloatToInt => float_ops::float_to_int(args),
        IsNan => float_ops::is_nan(args),
        IsInf => float_ops::is_inf(args),

        Rand => random::rand(rt, args),
        RandSeed => random::rand_seed(rt, args),
        RandRange => random::rand_range(rt, args),
        RandomBytes => random::random_bytes(rt, args),

        FileRead => file::file_read(args),
        FileWrite => file::file_write(args),
        FileAppend => file::file_append(args),
        FileExists => file::file_exists(args),
        FileDelete => file::file_delete(args),
        FileSize => file::file_size(args),
        FileCopy => file::file_copy(args),
        FileReadBytes => file::file_read_bytes(args),
        FileWriteBytes => file::file_write_bytes(args),

        RegexMatch => regex_ops::regex_match(args),
        RegexSearch => regex_ops::regex_search(args),
        RegexReplace => regex_ops::regex_replace(args),
        RegexSplit => regex_ops::regex_split(args),
        RegexFindAll => regex_ops::regex_find_all(args),

        JsonParse => json::json_parse(args),
        JsonStringify => json::json_stringify(args),

        BytesNew => encoding::bytes_new(args),
        BytesGet => encoding::bytes_get(args),
        BytesSet => encoding::bytes_set(args),
        BytesLen => encoding::bytes_len(args),
        BytesAppend => encoding::bytes_append(args),
        BytesWriteU16 => encoding::bytes_write_u16(args),
        BytesWriteU32 => encoding::bytes_write_u32(args),
        BytesWriteI64 => encoding::bytes_write_i64(args),
        BytesReadU16 => encoding::bytes_read_u16(args),
        BytesReadU32 => encoding::bytes_read_u32(args),
        BytesReadI64 => encoding::bytes_read_i64(args),
        IntToBytes => encoding::int_to_bytes(args),
        IntFromBytes => encoding::int_from_bytes(args),
        Base64Encode => encoding::base64_encode(args),
        Base64Decode => encoding::base64_decode(args),

        Sha256 => crypto::sha256(args),
        Md5 => crypto::md5(args),
        SecureCompare => crypto::secure_compare(args),

        ThreadCurrent => thread_ops::thread_current(rt, args),
        ThreadYield => thread_ops::thread_yield(args),
        ThreadSleep => thread_ops::thread_sleep(args),
        ThreadSpawn => thread_ops::thread_spawn(args),
        ThreadJoin => thread_ops::thread_join(rt, args),
        ThreadDetach => thread_ops::thread_detach(rt, args),
        MutexNew => thread_ops::mutex_new(rt, args),
        MutexLock => thread_ops::mutex_lock(rt, args),
        MutexTrylock => thread_ops::mutex_trylock(rt, args),
        MutexUnlock => thread_ops::mutex_unlock(rt, args),
        CondNew => thread_ops::cond_new(rt, args),
        CondWait => thread_ops::cond_wait(rt, args),
        CondSignal => thread_ops::cond_signal(rt, args),
        CondBroadcast => thread_ops::cond_broadcast(rt, args),

        ArrayNew => list_ops::array_new(args),
        ArrayLen => list_ops::array_len(args),
        ArrayPush => list_ops::array_push(args),
        ArrayPop => list_ops::array_pop(args),
        ArrayGet => list_ops::array_get(args),
        ArraySet => list_ops::array_set(args),
        ArrayInsert => list_ops::array_insert(args),
        ArrayRemove => list_ops::array_remove(args),
        ArraySlice => list_ops::array_slice(args),
        ArraySort => list_ops::array_sort(args),
        ArrayConcat => list_ops::array_concat(args),
        ArrayCopy => list_ops::array_copy(args),
        ArrayClear => list_ops::array_clear(args),
        ArrayIndexOf => list_ops::array_index_of(args),
        ArrayContains => list_ops::array_contains(args),
        ArrayReverse => list_ops::array_reverse(args),
        ArrayFill => list_ops::array_fill(args),

        MapNew => map_ops::map_new(args),
        MapLen => map_ops::map_len(args),
        MapGet => map_ops::map_get(args),
        MapSet => map_ops::map_set(args),
        MapHasKey => map_ops::map_has_key(args),
        MapDelete => map_ops::map_delete(args),
        MapKeys => map_ops::map_keys(args),
        MapValues => map_ops::map_values(args),

        Typeof => os::type_of(args),
        Tag => os::tag(args),
        Argv => os::argv(rt, args),
        Argc => os::argc(rt, args),
        Getenv => os::getenv(args),
        ClockMs => os::clock_ms(args),
        Exit => os::exit(rt, args),
        Sleep => os::sleep(args),
        ParseInt => os::parse_int(args),
        ParseFloat => os::parse_float(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_are_unique() {
        let mut seen = HashSet::new();
        for (name, _) in BUILTINS {
            assert!(seen.insert(*name), "duplicate builtin name {}", name);
        }
    }

    #[test]
    fn test_name_lookup_roundtrip() {
        for (name, id) in BUILTINS {
            assert_eq!(BuiltinId::from_name(name), Some(*id));
            assert_eq!(id.name(), *name);
        }
        assert_eq!(BuiltinId::from_name("no_such_builtin"), None);
    }

    #[test]
    fn test_registry_covers_the_full_surface() {
        assert!(BUILTINS.len() >= 150, "got {}", BUILTINS.len());
    }

    #[test]
    fn test_dispatch_smoke() {
        let mut rt = Runtime::new();
        assert_eq!(
            call(&mut rt, BuiltinId::StrUpper, &[Value::str("ab")]).unwrap(),
            Value::str("AB")
        );
        assert_eq!(
            call(&mut rt, BuiltinId::Abs, &[Value::Int(-3)]).unwrap(),
            Value::Int(3)
        );
        assert_eq!(
            call(&mut rt, BuiltinId::Typeof, &[Value::Float(0.0)]).unwrap(),
            Value::str("float")
        );
    }

    #[test]
    fn test_dispatch_propagates_fatal_errors() {
        let mut rt = Runtime::new();
        let err = call(&mut rt, BuiltinId::StrUpper, &[Value::Int(1)]).unwrap_err();
        assert_eq!(
            err.message(),
            "str_upper: expected str at argument 1, got int"
        );
        let err = call(&mut rt, BuiltinId::ArrayPop, &[Value::array(0)]).unwrap_err();
        assert_eq!(err.message(), "array_pop: empty array");
    }

    #[test]
    fn test_exit_reaches_runtime_through_dispatch() {
        let mut rt = Runtime::new();
        call(&mut rt, BuiltinId::Exit, &[Value::Int(2)]).unwrap();
        assert_eq!(rt.take_exit(), Some(2));
    }
}
