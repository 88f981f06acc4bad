/// Declares the closed set of persisted entities: the `EntityKind` tag, the type-erased
/// `Record` handed to the store and one `Entity` impl per struct. Declaration order is the
/// flush order.
macro_rules! entities {
    ($($name:ident),* $(,)?) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum EntityKind {
            $($name),*
        }

        impl EntityKind {
            pub const ALL: &'static [EntityKind] = &[$(EntityKind::$name),*];

            pub fn name(&self) -> &'static str {
                match self {
                    $(EntityKind::$name => stringify!($name)),*
                }
            }
        }

        #[derive(Clone, Debug, PartialEq)]
        pub enum Record {
            $($name($name)),*
        }

        impl Record {
            pub fn kind(&self) -> EntityKind {
                match self {
                    $(Record::$name(_) => EntityKind::$name),*
                }
            }

            pub fn id(&self) -> &str {
                match self {
                    $(Record::$name(entity) => &entity.id),*
                }
            }
        }

        $(
            impl Entity for $name {
                const KIND: EntityKind = EntityKind::$name;

                fn id(&self) -> &str {
                    &self.id
                }

                fn into_record(self) -> Record {
                    Record::$name(self)
                }

                #[allow(unreachable_patterns)]
                fn from_record(record: Record) -> Option<Self> {
                    match record {
                        Record::$name(entity) => Some(entity),
                        _ => None,
                    }
                }

                #[allow(unreachable_patterns)]
                fn from_record_ref(record: &Record) -> Option<&Self> {
                    match record {
                        Record::$name(entity) => Some(entity),
                        _ => None,
                    }
                }

                #[allow(unreachable_patterns)]
                fn from_record_mut(record: &mut Record) -> Option<&mut Self> {
                    match record {
                        Record::$name(entity) => Some(entity),
                        _ => None,
                    }
                }
            }
        )*
    };
}
