use crate::sql::identifier::Identifier;

macro_rules! keywords {
    (
        reserved { $($reserved:ident = $rid:expr,)* }
        known { $($known:ident = $kid:expr,)* }
    ) => {
        impl Identifier {
            $(pub const $reserved: Identifier = Identifier::from_raw($rid);)*
            $(pub const $known: Identifier = Identifier::from_raw($kid);)*
        }

        /// Reserved keywords, spelled the way they are displayed.
        pub(crate) const RESERVED: &[(&str, Identifier)] =
            &[$((stringify!($reserved), Identifier::$reserved),)*];

        /// Well-known names that are not reserved, displayed lowercase.
        pub(crate) const KNOWN: &[(&str, Identifier)] =
            &[$((stringify!($known), Identifier::$known),)*];
    };
}

keywords! {
    reserved {
        ALL = -1,
        AND = -2,
        AS = -3,
        ASC = -4,
        BEGIN = -5,
        BETWEEN = -6,
        BY = -7,
        CASCADE = -8,
        CHECK = -9,
        COMMIT = -10,
        CONSTRAINT = -11,
        CREATE = -12,
        DEFAULT = -13,
        DELETE = -14,
        DESC = -15,
        DISTINCT = -16,
        DROP = -17,
        EXISTS = -18,
        FALSE = -19,
        FOREIGN = -20,
        FROM = -21,
        FULL = -22,
        GROUP = -23,
        HAVING = -24,
        IF = -25,
        IN = -26,
        INDEX = -27,
        INNER = -28,
        INSERT = -29,
        INTO = -30,
        IS = -31,
        JOIN = -32,
        KEY = -33,
        LEFT = -34,
        LIMIT = -35,
        NOT = -36,
        NULL = -37,
        OFFSET = -38,
        ON = -39,
        OR = -40,
        ORDER = -41,
        OUTER = -42,
        PRIMARY = -43,
        REFERENCES = -44,
        RIGHT = -45,
        ROLLBACK = -46,
        SELECT = -47,
        SET = -48,
        TABLE = -49,
        TRUE = -50,
        UNIQUE = -51,
        UPDATE = -52,
        USING = -53,
        VALUES = -54,
        WHERE = -55,
    }
    known {
        BIGINT = 1,
        BINARY = 2,
        BOOL = 3,
        BOOLEAN = 4,
        BYTEA = 5,
        BYTES = 6,
        CHAR = 7,
        COUNT = 8,
        DATABASE = 9,
        DOUBLE = 10,
        INFO = 11,
        INT = 12,
        INT2 = 13,
        INT4 = 14,
        INT8 = 15,
        INTEGER = 16,
        MAX = 17,
        METADATA = 18,
        MIN = 19,
        PRECISION = 20,
        PUBLIC = 21,
        REAL = 22,
        SCHEMA = 23,
        SMALLINT = 24,
        SYSTEM = 25,
        TEXT = 26,
        VARBINARY = 27,
        VARCHAR = 28,
    }
}

/// First value handed out to identifiers interned at runtime.
pub(crate) const FIRST_USER_IDENTIFIER: i32 = 29;
