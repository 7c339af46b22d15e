//! Per-field declarations and the column classifier.

use crate::value::ScalarKind;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Optional literal SQL substituted for a column's bound value, plus its re-read flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Override {
    pub value: Option<&'static str>,
    pub auto_sync: bool,
}

impl Override {
    pub const NONE: Self = Self {
        value: None,
        auto_sync: false,
    };

    pub const fn literal(value: &'static str) -> Self {
        Self {
            value: Some(value),
            auto_sync: false,
        }
    }

    pub const fn auto_sync(mut self) -> Self {
        self.auto_sync = true;
        self
    }
}

/// Declared metadata of one record field, as emitted by `#[derive(Table)]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    /// Position of the field in declaration order; also the accessor index.
    pub field: usize,
    pub name: &'static str,
    pub column: Option<&'static str>,
    pub ordinal: Option<i32>,
    pub kind: ScalarKind,
    pub nullable: bool,
    pub key: bool,
    pub auto_increment: bool,
    pub not_mapped: bool,
    pub ignore_select: bool,
    pub ignore_insert: Option<Override>,
    pub ignore_update: Option<Override>,
    pub match_update: Option<Override>,
    pub match_delete: bool,
}

impl ColumnDef {
    pub const fn new(field: usize, name: &'static str, kind: ScalarKind) -> Self {
        Self {
            field,
            name,
            column: None,
            ordinal: None,
            kind,
            nullable: false,
            key: false,
            auto_increment: false,
            not_mapped: false,
            ignore_select: false,
            ignore_insert: None,
            ignore_update: None,
            match_update: None,
            match_delete: false,
        }
    }

    pub const fn column(mut self, column: &'static str) -> Self {
        self.column = Some(column);
        self
    }

    /// Rendering position override.
    ///
    /// Columns sort stably by position, where a column without an override sits at its
    /// declaration index. `ordinal = 0` on the third field therefore ties with the first field
    /// and lands second; a negative ordinal moves a column ahead of every unannotated one.
    pub const fn ordinal(mut self, ordinal: i32) -> Self {
        self.ordinal = Some(ordinal);
        self
    }

    pub const fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub const fn key(mut self) -> Self {
        self.key = true;
        self
    }

    pub const fn auto_increment(mut self) -> Self {
        self.key = true;
        self.auto_increment = true;
        self
    }

    pub const fn not_mapped(mut self) -> Self {
        self.not_mapped = true;
        self
    }

    pub const fn ignore_select(mut self) -> Self {
        self.ignore_select = true;
        self
    }

    pub const fn ignore_insert(mut self, o: Override) -> Self {
        self.ignore_insert = Some(o);
        self
    }

    pub const fn ignore_update(mut self, o: Override) -> Self {
        self.ignore_update = Some(o);
        self
    }

    pub const fn match_update(mut self, o: Override) -> Self {
        self.match_update = Some(o);
        self
    }

    pub const fn match_delete(mut self) -> Self {
        self.match_delete = true;
        self
    }

    /// Database column name.
    pub fn column_name(&self) -> &'static str {
        self.column.unwrap_or(self.name)
    }
}

/// Behavioral attribute set of a classified column.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ColumnFlags(u16);

impl ColumnFlags {
    pub const NONE: Self = Self(0);
    pub const KEY: Self = Self(1 << 0);
    pub const AUTO_KEY: Self = Self(1 << 1);
    pub const IGNORE_SELECT: Self = Self(1 << 2);
    pub const IGNORE_INSERT: Self = Self(1 << 3);
    pub const IGNORE_UPDATE: Self = Self(1 << 4);
    pub const MATCH_UPDATE: Self = Self(1 << 5);
    pub const MATCH_DELETE: Self = Self(1 << 6);
    pub const NOT_MAPPED: Self = Self(1 << 7);
    pub const INSERT_AUTO_SYNC: Self = Self(1 << 8);
    pub const UPDATE_AUTO_SYNC: Self = Self(1 << 9);

    const NAMES: [(Self, &'static str); 10] = [
        (Self::KEY, "Key"),
        (Self::AUTO_KEY, "AutoKey"),
        (Self::IGNORE_SELECT, "IgnoreSelect"),
        (Self::IGNORE_INSERT, "IgnoreInsert"),
        (Self::IGNORE_UPDATE, "IgnoreUpdate"),
        (Self::MATCH_UPDATE, "MatchUpdate"),
        (Self::MATCH_DELETE, "MatchDelete"),
        (Self::NOT_MAPPED, "NotMapped"),
        (Self::INSERT_AUTO_SYNC, "InsertAutoSync"),
        (Self::UPDATE_AUTO_SYNC, "UpdateAutoSync"),
    ];

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn bits(self) -> u16 {
        self.0
    }
}

impl BitOr for ColumnFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ColumnFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for ColumnFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut set = f.debug_set();
        for (flag, name) in Self::NAMES {
            if self.contains(flag) {
                set.entry(&format_args!("{name}"));
            }
        }
        set.finish()
    }
}

/// A classified column: the canonical descriptor every statement is rendered from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub field: usize,
    pub name: &'static str,
    pub column: &'static str,
    /// Dialect-quoted column name.
    pub quoted: String,
    pub kind: ScalarKind,
    pub nullable: bool,
    pub flags: ColumnFlags,
    pub insert_value: Option<&'static str>,
    pub update_value: Option<&'static str>,
    pub(crate) auto_increment_requested: bool,
}

impl Column {
    pub fn is(&self, flag: ColumnFlags) -> bool {
        self.flags.contains(flag)
    }

    pub fn is_key(&self) -> bool {
        self.is(ColumnFlags::KEY)
    }

    pub fn is_mapped(&self) -> bool {
        !self.is(ColumnFlags::NOT_MAPPED)
    }
}

/// Classify one field declaration.
///
/// Precedence: key first, then not-mapped, then the independent behavior flags.
/// `ignore_update` wins over `match_update` when both are declared. Invalid
/// auto-increment requests are only recorded here; the metadata builder rejects them.
pub fn classify(def: &ColumnDef, quoted: String) -> Column {
    let mut flags = ColumnFlags::NONE;
    let mut insert_value = None;
    let mut update_value = None;
    let mut auto_increment_requested = false;

    if def.key || def.auto_increment {
        flags |= ColumnFlags::KEY;
        if def.auto_increment {
            auto_increment_requested = true;
            if def.kind.is_integral() {
                flags |= ColumnFlags::AUTO_KEY;
            }
        }
    } else if def.not_mapped {
        flags |= ColumnFlags::NOT_MAPPED
            | ColumnFlags::IGNORE_SELECT
            | ColumnFlags::IGNORE_INSERT
            | ColumnFlags::IGNORE_UPDATE;
    } else {
        if def.ignore_select {
            flags |= ColumnFlags::IGNORE_SELECT;
        }
        if let Some(o) = def.ignore_insert {
            flags |= ColumnFlags::IGNORE_INSERT;
            insert_value = o.value;
            if o.auto_sync {
                flags |= ColumnFlags::INSERT_AUTO_SYNC;
            }
        }
        if let Some(o) = def.ignore_update {
            flags |= ColumnFlags::IGNORE_UPDATE;
            update_value = o.value;
            if o.auto_sync {
                flags |= ColumnFlags::UPDATE_AUTO_SYNC;
            }
        } else if let Some(o) = def.match_update {
            flags |= ColumnFlags::MATCH_UPDATE;
            update_value = o.value;
            if o.auto_sync {
                flags |= ColumnFlags::UPDATE_AUTO_SYNC;
            }
        }
        if def.match_delete {
            flags |= ColumnFlags::MATCH_DELETE;
        }
    }

    Column {
        field: def.field,
        name: def.name,
        column: def.column_name(),
        quoted,
        kind: def.kind,
        nullable: def.nullable,
        flags,
        insert_value,
        update_value,
        auto_increment_requested,
    }
}
