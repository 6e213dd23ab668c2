// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Structured construct keywords.

use std::fmt;

/// One structured-flow construct invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Construct {
    If,
    Else,
    EndIf,
    Switch,
    Case,
    EndCase,
    EndSwitch,
    Do,
    While,
    Until,
    EndDo,
    Forever,
    Loop,
    Break,
    Continue,
}

impl Construct {
    pub const ALL: [Construct; 15] = [
        Construct::If,
        Construct::Else,
        Construct::EndIf,
        Construct::Switch,
        Construct::Case,
        Construct::EndCase,
        Construct::EndSwitch,
        Construct::Do,
        Construct::While,
        Construct::Until,
        Construct::EndDo,
        Construct::Forever,
        Construct::Loop,
        Construct::Break,
        Construct::Continue,
    ];

    /// Directive spelling, without the leading dot.
    pub fn keyword(self) -> &'static str {
        match self {
            Construct::If => "if",
            Construct::Else => "else",
            Construct::EndIf => "endif",
            Construct::Switch => "switch",
            Construct::Case => "case",
            Construct::EndCase => "endcase",
            Construct::EndSwitch => "endswitch",
            Construct::Do => "do",
            Construct::While => "while",
            Construct::Until => "until",
            Construct::EndDo => "enddo",
            Construct::Forever => "forever",
            Construct::Loop => "loop",
            Construct::Break => "break",
            Construct::Continue => "continue",
        }
    }

    pub fn from_keyword(word: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|construct| construct.keyword().eq_ignore_ascii_case(word))
    }

    /// Whether the construct requires a condition operand.
    pub fn takes_condition(self) -> bool {
        matches!(
            self,
            Construct::If | Construct::Case | Construct::While | Construct::Until
        )
    }
}

impl fmt::Display for Construct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ".{}", self.keyword())
    }
}
