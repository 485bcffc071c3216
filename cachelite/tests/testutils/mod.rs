//! Test utilities for CacheLite integration tests
//!
//! Provides the cacheable entity types the tests exercise (a customer with
//! a collection of bank accounts, and a single-link chain
//! EntityC -> EntityA -> EntityB -> EntityD for depth coverage) plus an
//! isolated provider fixture per test.

#![allow(dead_code)]

use cachelite::{
    CacheConfig, CacheError, CacheProvider, CacheStamp, Cacheable, CacheableType, MemberAccessor,
    MemberDescriptor, MemoryStore, TypeDescriptor,
};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::sync::Arc;

/// Test fixture with an isolated provider over a sled store in a temp dir
pub struct TestFixture {
    pub provider: CacheProvider,
    _temp_dir: tempfile::TempDir,
}

impl TestFixture {
    pub fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
        let provider = CacheProvider::open(&CacheConfig::new(temp_dir.path().join("cache_test")))
            .expect("failed to open cache provider");
        register_types(&provider);
        TestFixture {
            provider,
            _temp_dir: temp_dir,
        }
    }

    /// Fixture over a memory store, returning the store handle so tests can
    /// observe write operations
    pub fn in_memory() -> (Self, Arc<MemoryStore>) {
        let _ = env_logger::builder().is_test(true).try_init();
        let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
        let store = Arc::new(MemoryStore::new());
        let provider = CacheProvider::with_store(store.clone());
        register_types(&provider);
        (
            TestFixture {
                provider,
                _temp_dir: temp_dir,
            },
            store,
        )
    }

    /// Path of the fixture's store directory, for tests that reopen it
    pub fn store_path(&self) -> std::path::PathBuf {
        self._temp_dir.path().join("cache_test")
    }
}

pub fn register_types(provider: &CacheProvider) {
    provider.register_type::<Customer>();
    provider.register_type::<BankAccount>();
    provider.register_type::<EntityA>();
    provider.register_type::<EntityB>();
    provider.register_type::<EntityC>();
    provider.register_type::<EntityD>();
    provider.register_type::<EntityNode>();
}

/// Random uppercase ASCII string for unique entity names
pub fn random_name(size: usize) -> String {
    (0..size)
        .map(|_| char::from(fastrand::u8(0x41..0x5B)))
        .collect()
}

pub fn downcast<T: 'static>(value: &dyn Cacheable) -> &T {
    value
        .as_any()
        .downcast_ref::<T>()
        .expect("cached value has unexpected type")
}

// ---------------------------------------------------------------------------
// Customer / BankAccount
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub bank_accounts: Vec<BankAccount>,
    pub stamp: CacheStamp,
}

impl Customer {
    pub fn named(id: i64, first_name: &str, last_name: &str) -> Self {
        Customer {
            id,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            ..Default::default()
        }
    }
}

fn decode_customer(bytes: &[u8]) -> Result<Box<dyn Cacheable>, CacheError> {
    let value: Customer = bincode::deserialize(bytes)
        .map_err(|e| CacheError::Serialization(e.to_string()))?;
    Ok(Box::new(value))
}

impl Cacheable for Customer {
    fn cache_key(&self) -> String {
        self.id.to_string()
    }

    fn type_name(&self) -> &'static str {
        "Customer"
    }

    fn stamp(&self) -> &CacheStamp {
        &self.stamp
    }

    fn stamp_mut(&mut self) -> &mut CacheStamp {
        &mut self.stamp
    }

    fn descriptor(&self) -> TypeDescriptor {
        Self::cache_descriptor()
    }

    fn encode(&self) -> Result<Vec<u8>, CacheError> {
        bincode::serialize(self).map_err(|e| CacheError::Serialization(e.to_string()))
    }

    fn clone_boxed(&self) -> Box<dyn Cacheable> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl CacheableType for Customer {
    fn cache_descriptor() -> TypeDescriptor {
        TypeDescriptor {
            type_name: "Customer",
            members: vec![MemberDescriptor {
                name: "bank_accounts",
                child_type: "BankAccount",
                accessor: MemberAccessor::Collection {
                    get: |value| {
                        let customer = value.as_any().downcast_ref::<Customer>()?;
                        if customer.bank_accounts.is_empty() {
                            return None;
                        }
                        Some(
                            customer
                                .bank_accounts
                                .iter()
                                .map(|account| account.clone_boxed())
                                .collect(),
                        )
                    },
                    set: |value, children| {
                        if let Some(customer) = value.as_any_mut().downcast_mut::<Customer>() {
                            customer.bank_accounts = children
                                .into_iter()
                                .filter_map(|child| {
                                    child.into_any().downcast::<BankAccount>().ok()
                                })
                                .map(|boxed| *boxed)
                                .collect();
                        }
                    },
                },
            }],
            decode: decode_customer,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BankAccount {
    pub bic: String,
    pub iban: String,
    pub stamp: CacheStamp,
}

impl BankAccount {
    pub fn new(bic: &str, iban: &str) -> Self {
        BankAccount {
            bic: bic.to_string(),
            iban: iban.to_string(),
            ..Default::default()
        }
    }
}

fn decode_bank_account(bytes: &[u8]) -> Result<Box<dyn Cacheable>, CacheError> {
    let value: BankAccount = bincode::deserialize(bytes)
        .map_err(|e| CacheError::Serialization(e.to_string()))?;
    Ok(Box::new(value))
}

impl Cacheable for BankAccount {
    fn cache_key(&self) -> String {
        self.bic.clone()
    }

    fn type_name(&self) -> &'static str {
        "BankAccount"
    }

    fn stamp(&self) -> &CacheStamp {
        &self.stamp
    }

    fn stamp_mut(&mut self) -> &mut CacheStamp {
        &mut self.stamp
    }

    fn descriptor(&self) -> TypeDescriptor {
        Self::cache_descriptor()
    }

    fn encode(&self) -> Result<Vec<u8>, CacheError> {
        bincode::serialize(self).map_err(|e| CacheError::Serialization(e.to_string()))
    }

    fn clone_boxed(&self) -> Box<dyn Cacheable> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl CacheableType for BankAccount {
    fn cache_descriptor() -> TypeDescriptor {
        TypeDescriptor {
            type_name: "BankAccount",
            members: Vec::new(),
            decode: decode_bank_account,
        }
    }
}

// ---------------------------------------------------------------------------
// EntityC -> EntityA -> EntityB -> EntityD chain
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityD {
    pub id: i64,
    pub stamp: CacheStamp,
}

fn decode_entity_d(bytes: &[u8]) -> Result<Box<dyn Cacheable>, CacheError> {
    let value: EntityD = bincode::deserialize(bytes)
        .map_err(|e| CacheError::Serialization(e.to_string()))?;
    Ok(Box::new(value))
}

impl Cacheable for EntityD {
    fn cache_key(&self) -> String {
        self.id.to_string()
    }

    fn type_name(&self) -> &'static str {
        "EntityD"
    }

    fn stamp(&self) -> &CacheStamp {
        &self.stamp
    }

    fn stamp_mut(&mut self) -> &mut CacheStamp {
        &mut self.stamp
    }

    fn descriptor(&self) -> TypeDescriptor {
        Self::cache_descriptor()
    }

    fn encode(&self) -> Result<Vec<u8>, CacheError> {
        bincode::serialize(self).map_err(|e| CacheError::Serialization(e.to_string()))
    }

    fn clone_boxed(&self) -> Box<dyn Cacheable> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl CacheableType for EntityD {
    fn cache_descriptor() -> TypeDescriptor {
        TypeDescriptor {
            type_name: "EntityD",
            members: Vec::new(),
            decode: decode_entity_d,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityB {
    pub id: i64,
    pub entity_d: Option<EntityD>,
    pub stamp: CacheStamp,
}

fn decode_entity_b(bytes: &[u8]) -> Result<Box<dyn Cacheable>, CacheError> {
    let value: EntityB = bincode::deserialize(bytes)
        .map_err(|e| CacheError::Serialization(e.to_string()))?;
    Ok(Box::new(value))
}

impl Cacheable for EntityB {
    fn cache_key(&self) -> String {
        self.id.to_string()
    }

    fn type_name(&self) -> &'static str {
        "EntityB"
    }

    fn stamp(&self) -> &CacheStamp {
        &self.stamp
    }

    fn stamp_mut(&mut self) -> &mut CacheStamp {
        &mut self.stamp
    }

    fn descriptor(&self) -> TypeDescriptor {
        Self::cache_descriptor()
    }

    fn encode(&self) -> Result<Vec<u8>, CacheError> {
        bincode::serialize(self).map_err(|e| CacheError::Serialization(e.to_string()))
    }

    fn clone_boxed(&self) -> Box<dyn Cacheable> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl CacheableType for EntityB {
    fn cache_descriptor() -> TypeDescriptor {
        TypeDescriptor {
            type_name: "EntityB",
            members: vec![MemberDescriptor {
                name: "entity_d",
                child_type: "EntityD",
                accessor: MemberAccessor::Single {
                    get: |value| {
                        let entity = value.as_any().downcast_ref::<EntityB>()?;
                        entity.entity_d.as_ref().map(|d| d.clone_boxed())
                    },
                    set: |value, child| {
                        if let Some(entity) = value.as_any_mut().downcast_mut::<EntityB>() {
                            if let Ok(child) = child.into_any().downcast::<EntityD>() {
                                entity.entity_d = Some(*child);
                            }
                        }
                    },
                },
            }],
            decode: decode_entity_b,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityA {
    pub name: String,
    pub entity_b: Option<EntityB>,
    pub stamp: CacheStamp,
}

fn decode_entity_a(bytes: &[u8]) -> Result<Box<dyn Cacheable>, CacheError> {
    let value: EntityA = bincode::deserialize(bytes)
        .map_err(|e| CacheError::Serialization(e.to_string()))?;
    Ok(Box::new(value))
}

impl Cacheable for EntityA {
    fn cache_key(&self) -> String {
        self.name.clone()
    }

    fn type_name(&self) -> &'static str {
        "EntityA"
    }

    fn stamp(&self) -> &CacheStamp {
        &self.stamp
    }

    fn stamp_mut(&mut self) -> &mut CacheStamp {
        &mut self.stamp
    }

    fn descriptor(&self) -> TypeDescriptor {
        Self::cache_descriptor()
    }

    fn encode(&self) -> Result<Vec<u8>, CacheError> {
        bincode::serialize(self).map_err(|e| CacheError::Serialization(e.to_string()))
    }

    fn clone_boxed(&self) -> Box<dyn Cacheable> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl CacheableType for EntityA {
    fn cache_descriptor() -> TypeDescriptor {
        TypeDescriptor {
            type_name: "EntityA",
            members: vec![MemberDescriptor {
                name: "entity_b",
                child_type: "EntityB",
                accessor: MemberAccessor::Single {
                    get: |value| {
                        let entity = value.as_any().downcast_ref::<EntityA>()?;
                        entity.entity_b.as_ref().map(|b| b.clone_boxed())
                    },
                    set: |value, child| {
                        if let Some(entity) = value.as_any_mut().downcast_mut::<EntityA>() {
                            if let Ok(child) = child.into_any().downcast::<EntityB>() {
                                entity.entity_b = Some(*child);
                            }
                        }
                    },
                },
            }],
            decode: decode_entity_a,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityC {
    pub id: i64,
    pub entity_a: Option<EntityA>,
    pub entity_b_list: Vec<EntityB>,
    pub stamp: CacheStamp,
}

fn decode_entity_c(bytes: &[u8]) -> Result<Box<dyn Cacheable>, CacheError> {
    let value: EntityC = bincode::deserialize(bytes)
        .map_err(|e| CacheError::Serialization(e.to_string()))?;
    Ok(Box::new(value))
}

impl Cacheable for EntityC {
    fn cache_key(&self) -> String {
        self.id.to_string()
    }

    fn type_name(&self) -> &'static str {
        "EntityC"
    }

    fn stamp(&self) -> &CacheStamp {
        &self.stamp
    }

    fn stamp_mut(&mut self) -> &mut CacheStamp {
        &mut self.stamp
    }

    fn descriptor(&self) -> TypeDescriptor {
        Self::cache_descriptor()
    }

    fn encode(&self) -> Result<Vec<u8>, CacheError> {
        bincode::serialize(self).map_err(|e| CacheError::Serialization(e.to_string()))
    }

    fn clone_boxed(&self) -> Box<dyn Cacheable> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl CacheableType for EntityC {
    fn cache_descriptor() -> TypeDescriptor {
        TypeDescriptor {
            type_name: "EntityC",
            members: vec![
                MemberDescriptor {
                    name: "entity_a",
                    child_type: "EntityA",
                    accessor: MemberAccessor::Single {
                        get: |value| {
                            let entity = value.as_any().downcast_ref::<EntityC>()?;
                            entity.entity_a.as_ref().map(|a| a.clone_boxed())
                        },
                        set: |value, child| {
                            if let Some(entity) = value.as_any_mut().downcast_mut::<EntityC>() {
                                if let Ok(child) = child.into_any().downcast::<EntityA>() {
                                    entity.entity_a = Some(*child);
                                }
                            }
                        },
                    },
                },
                MemberDescriptor {
                    name: "entity_b_list",
                    child_type: "EntityB",
                    accessor: MemberAccessor::Collection {
                        get: |value| {
                            let entity = value.as_any().downcast_ref::<EntityC>()?;
                            if entity.entity_b_list.is_empty() {
                                return None;
                            }
                            Some(
                                entity
                                    .entity_b_list
                                    .iter()
                                    .map(|b| b.clone_boxed())
                                    .collect(),
                            )
                        },
                        set: |value, children| {
                            if let Some(entity) = value.as_any_mut().downcast_mut::<EntityC>() {
                                entity.entity_b_list = children
                                    .into_iter()
                                    .filter_map(|child| {
                                        child.into_any().downcast::<EntityB>().ok()
                                    })
                                    .map(|boxed| *boxed)
                                    .collect();
                            }
                        },
                    },
                },
            ],
            decode: decode_entity_c,
        }
    }
}

// ---------------------------------------------------------------------------
// EntityNode: self-typed link, exercises the visited-set guards
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityNode {
    pub id: i64,
    pub next: Option<Box<EntityNode>>,
    pub stamp: CacheStamp,
}

fn decode_entity_node(bytes: &[u8]) -> Result<Box<dyn Cacheable>, CacheError> {
    let value: EntityNode = bincode::deserialize(bytes)
        .map_err(|e| CacheError::Serialization(e.to_string()))?;
    Ok(Box::new(value))
}

impl Cacheable for EntityNode {
    fn cache_key(&self) -> String {
        self.id.to_string()
    }

    fn type_name(&self) -> &'static str {
        "EntityNode"
    }

    fn stamp(&self) -> &CacheStamp {
        &self.stamp
    }

    fn stamp_mut(&mut self) -> &mut CacheStamp {
        &mut self.stamp
    }

    fn descriptor(&self) -> TypeDescriptor {
        Self::cache_descriptor()
    }

    fn encode(&self) -> Result<Vec<u8>, CacheError> {
        bincode::serialize(self).map_err(|e| CacheError::Serialization(e.to_string()))
    }

    fn clone_boxed(&self) -> Box<dyn Cacheable> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl CacheableType for EntityNode {
    fn cache_descriptor() -> TypeDescriptor {
        TypeDescriptor {
            type_name: "EntityNode",
            members: vec![MemberDescriptor {
                name: "next",
                child_type: "EntityNode",
                accessor: MemberAccessor::Single {
                    get: |value| {
                        let node = value.as_any().downcast_ref::<EntityNode>()?;
                        node.next.as_ref().map(|next| next.clone_boxed())
                    },
                    set: |value, child| {
                        if let Some(node) = value.as_any_mut().downcast_mut::<EntityNode>() {
                            if let Ok(child) = child.into_any().downcast::<EntityNode>() {
                                node.next = Some(child);
                            }
                        }
                    },
                },
            }],
            decode: decode_entity_node,
        }
    }
}
