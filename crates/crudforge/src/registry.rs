//! Process-wide cache of per-type builders.
//!
//! The first request for a record type validates its declaration and builds its
//! [`TypeMetadata`]; every later request, from any thread, returns the same shared
//! instances. A declaration that fails to validate is never cached: each request
//! reports the same configuration error again.
//!
//! Statement groups inside a builder compile lazily on their own first use, so a
//! program that never runs a bulk operation never renders bulk SQL.

mod once;

use crate::config::config;
use crate::equality::EqualityComparer;
use crate::error::{OrmError, OrmResult};
use crate::keyed::KeyStatements;
use crate::meta::{Table, TypeMetadata};
use crate::statements::Statements;
use crate::value::KeyType;
use dashmap::DashMap;
use once::OnceSlot;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::{Arc, LazyLock};

type Erased = Arc<dyn Any + Send + Sync>;

static BUILDERS: LazyLock<DashMap<TypeId, Erased>> = LazyLock::new(DashMap::new);

/// Everything cached for one record type.
pub struct CrudBuilder<T: Table> {
    info: Arc<TypeMetadata>,
    statements: Arc<Statements<T>>,
    comparer: Arc<EqualityComparer<T>>,
    keyed: DashMap<TypeId, Erased>,
}

impl<T: Table> fmt::Debug for CrudBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrudBuilder")
            .field("type_name", &self.info.type_name())
            .field("key_variants", &self.keyed.len())
            .finish()
    }
}

impl<T: Table> CrudBuilder<T> {
    fn build() -> OrmResult<Self> {
        let info = Arc::new(TypeMetadata::build(&T::TABLE)?);
        Ok(Self {
            statements: Arc::new(Statements::new(info.clone())),
            comparer: Arc::new(EqualityComparer::new(&info)),
            keyed: DashMap::new(),
            info,
        })
    }

    pub fn info(&self) -> &Arc<TypeMetadata> {
        &self.info
    }

    pub fn statements(&self) -> &Arc<Statements<T>> {
        &self.statements
    }

    pub fn equality_comparer(&self) -> &Arc<EqualityComparer<T>> {
        &self.comparer
    }

    /// Key-specialized statements for key type `K`, compiled on first request.
    pub fn key_statements<K: KeyType>(&self) -> OrmResult<Arc<KeyStatements<T, K>>> {
        let slot = slot_in::<Arc<KeyStatements<T, K>>>(&self.keyed, TypeId::of::<K>())?;
        slot.get_or_try_init(|| {
            KeyStatements::new(self.info.clone(), config().key_batch_size).map(Arc::new)
        })
        .cloned()
    }
}

/// Find or insert the slot for `id`, releasing the map guard before returning.
fn slot_in<V: Send + Sync + 'static>(
    map: &DashMap<TypeId, Erased>,
    id: TypeId,
) -> OrmResult<Arc<OnceSlot<V>>> {
    let erased = map
        .entry(id)
        .or_insert_with(|| Arc::new(OnceSlot::<V>::new()) as Erased)
        .clone();
    erased
        .downcast::<OnceSlot<V>>()
        .map_err(|_| OrmError::Other("builder cache entry has an unexpected type".to_string()))
}

/// The cached builder of `T`, built on first request.
pub fn builder<T: Table>() -> OrmResult<Arc<CrudBuilder<T>>> {
    let slot = slot_in::<Arc<CrudBuilder<T>>>(&BUILDERS, TypeId::of::<T>())?;
    let built = slot.get_or_try_init(|| {
        let builder = CrudBuilder::<T>::build();
        if let Err(err) = &builder {
            tracing::warn!(
                target: "crudforge.registry",
                type_name = T::TABLE.type_name,
                error = %err,
                "record type rejected"
            );
        }
        builder.map(Arc::new)
    })?;
    Ok(built.clone())
}

/// Validated metadata of `T`.
pub fn type_info<T: Table>() -> OrmResult<Arc<TypeMetadata>> {
    Ok(builder::<T>()?.info.clone())
}

/// Compiled statements of `T`.
pub fn statements<T: Table>() -> OrmResult<Arc<Statements<T>>> {
    Ok(builder::<T>()?.statements.clone())
}

/// Statements of `T` addressed by a bare key of type `K`.
///
/// Fails with a configuration error unless `T` has exactly one key column whose type
/// matches `K`.
pub fn key_statements<T: Table, K: KeyType>() -> OrmResult<Arc<KeyStatements<T, K>>> {
    builder::<T>()?.key_statements::<K>()
}

pub fn equality_comparer<T: Table>() -> OrmResult<Arc<EqualityComparer<T>>> {
    Ok(builder::<T>()?.comparer.clone())
}
