// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::mem;

enum ParseState {
    ScanningForArguments,
    ScanningArgument,
    ScanningQuotedArgument,
}

/// Returns true if the character passed is a whitespace character.
fn is_whitespace(c: char) -> bool {
    c == ' ' || c == '\t' || c == '\r' || c == '\n'
}

/// Returns true if the character passed is a quote.
fn is_quote(c: char) -> bool {
    c == '"'
}

fn is_escape(c: char) -> bool {
    c == '\\'
}

/// Parses raw command-line input into a list of separate arguments. Arguments
/// are separated by whitespace, can be quoted, and can have escaped characters
/// inside of them. A quote may also open in the middle of an argument, in
/// which case the quoted text is glued onto it.
pub fn input_to_arguments(input: &str) -> Result<Vec<String>, &'static str> {
    let mut state = ParseState::ScanningForArguments;
    let mut args: Vec<String> = Vec::new();
    let mut arg = String::new();
    let mut escaped = false;

    for c in input.chars() {
        if escaped {
            arg.push(c);
            escaped = false;
            continue;
        }

        match state {
            ParseState::ScanningForArguments => {
                if is_escape(c) {
                    escaped = true;
                    state = ParseState::ScanningArgument;
                } else if is_quote(c) {
                    state = ParseState::ScanningQuotedArgument;
                } else if !is_whitespace(c) {
                    arg.push(c);
                    state = ParseState::ScanningArgument;
                }
            },
            ParseState::ScanningArgument => {
                if is_escape(c) {
                    escaped = true;
                } else if is_quote(c) {
                    state = ParseState::ScanningQuotedArgument;
                } else if is_whitespace(c) {
                    args.push(mem::take(&mut arg));
                    state = ParseState::ScanningForArguments;
                } else {
                    arg.push(c);
                }
            },
            ParseState::ScanningQuotedArgument => {
                if is_escape(c) {
                    escaped = true;
                } else if is_quote(c) {
                    state = ParseState::ScanningArgument;
                } else {
                    arg.push(c);
                }
            },
        }
    }

    if escaped {
        return Err("nothing left to escape");
    }

    match state {
        ParseState::ScanningQuotedArgument => Err("quoted arg does not close"),
        ParseState::ScanningArgument => {
            args.push(arg);
            Ok(args)
        },
        ParseState::ScanningForArguments => Ok(args),
    }
}

/// Parses a 16-bit hexadecimal address. "$C000", "0xC000" and "C000" are all
/// accepted.
pub fn parse_address(arg: &str) -> Option<u16> {
    let digits = arg.trim_start_matches('$').trim_start_matches("0x").trim_start_matches("0X");
    if digits.is_empty() {
        return None;
    }
    u16::from_str_radix(digits, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(input: &str) -> Vec<String> {
        input_to_arguments(input).unwrap()
    }

    #[test]
    fn splits_on_whitespace() {
        assert_eq!(args("dump  $0200\t16"), vec!["dump", "$0200", "16"]);
        assert_eq!(args("   "), Vec::<String>::new());
        assert_eq!(args("step\n"), vec!["step"]);
    }

    #[test]
    fn quotes_keep_whitespace() {
        assert_eq!(args("load \"roms/super mario.nes\""), vec!["load", "roms/super mario.nes"]);
        assert_eq!(args("load roms/\"a b\".nes"), vec!["load", "roms/a b.nes"]);
        assert_eq!(args("\"\""), vec![""]);
    }

    #[test]
    fn backslash_escapes_next_character() {
        assert_eq!(args("load a\\ b.nes"), vec!["load", "a b.nes"]);
        assert_eq!(args("say \"\\\"hi\\\"\""), vec!["say", "\"hi\""]);
    }

    #[test]
    fn unterminated_input_is_an_error() {
        assert_eq!(input_to_arguments("load \"roms/a.nes"), Err("quoted arg does not close"));
        assert_eq!(input_to_arguments("load a\\"), Err("nothing left to escape"));
    }

    #[test]
    fn addresses_accept_common_prefixes() {
        assert_eq!(parse_address("$C000"), Some(0xC000));
        assert_eq!(parse_address("0x00ff"), Some(0x00FF));
        assert_eq!(parse_address("8000"), Some(0x8000));
        assert_eq!(parse_address("$"), None);
        assert_eq!(parse_address("10000"), None);
        assert_eq!(parse_address("zz"), None);
    }
}
