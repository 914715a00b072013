//! Offset-based field access.
//!
//! Everything `unsafe` in the binder lives here. The invariant every function
//! relies on: the base address came from a live, properly aligned value of the
//! exact type the [`Model`] was parsed from, so `base + field.offset` points at
//! an initialized field of that field's declared type. The offsets and typed
//! accessors come from [`FieldSchema`](crate::model::FieldSchema), whose
//! layout is vouched for by the `unsafe impl Entity`; they never leave the
//! crate. The public constructors only accept references and
//! [`UnsafeValue::from_ptr`] checks for null; the factory in the parent module
//! checks the model's type identity.

use super::{FieldReader, Valuer, resolve_columns};
use crate::driver::Rows;
use crate::error::{OrmError, OrmResult};
use crate::model::{Entity, Model};
use crate::value::{FieldValue, Value};
use std::marker::PhantomData;
use std::ptr::NonNull;

/// Read the `F` stored at `ptr`.
///
/// # Safety
///
/// `ptr` must point to a live, aligned, initialized `F`.
pub(crate) unsafe fn read_at<F: FieldValue>(ptr: *const u8) -> Value {
    // SAFETY: guaranteed by the caller.
    unsafe { (*ptr.cast::<F>()).to_value() }
}

/// Decode `value` and store it into the `F` at `ptr`, dropping the old value.
///
/// # Safety
///
/// `ptr` must point to a live, aligned, initialized `F` that is not borrowed elsewhere.
pub(crate) unsafe fn write_at<F: FieldValue>(ptr: *mut u8, value: Value) -> OrmResult<()> {
    let decoded = F::from_value(value)?;
    // SAFETY: guaranteed by the caller.
    unsafe { *ptr.cast::<F>() = decoded };
    Ok(())
}

/// Offset-based read access.
pub struct UnsafeReader<'a> {
    base: NonNull<u8>,
    model: &'a Model,
    _borrow: PhantomData<&'a ()>,
}

impl<'a> UnsafeReader<'a> {
    pub(crate) fn new<T: Entity>(val: &'a T, model: &'a Model) -> Self {
        Self {
            base: NonNull::from(val).cast(),
            model,
            _borrow: PhantomData,
        }
    }
}

impl FieldReader for UnsafeReader<'_> {
    fn field(&self, name: &str) -> OrmResult<Value> {
        let fd = self.model.require_field(name)?;
        // SAFETY: `base` is a shared borrow of the model's type, see module docs.
        Ok(unsafe { (fd.read)(self.base.as_ptr().add(fd.offset)) })
    }
}

/// Offset-based read/write access.
pub struct UnsafeValue<'a> {
    base: NonNull<u8>,
    model: &'a Model,
    _borrow: PhantomData<&'a mut ()>,
}

impl<'a> UnsafeValue<'a> {
    pub(crate) fn new<T: Entity>(val: &'a mut T, model: &'a Model) -> Self {
        Self {
            base: NonNull::from(val).cast(),
            model,
            _borrow: PhantomData,
        }
    }

    /// Build a handle from a raw pointer.
    ///
    /// Fails with [`OrmError::NilInput`] on null and with
    /// [`OrmError::ModelMismatch`] if `model` was not parsed from `T`.
    ///
    /// # Safety
    ///
    /// A non-null `ptr` must point to a live `T` that stays valid and unaliased for `'a`.
    pub unsafe fn from_ptr<T: Entity>(ptr: *mut T, model: &'a Model) -> OrmResult<Self> {
        let base = NonNull::new(ptr).ok_or(OrmError::NilInput)?;
        model.check_type::<T>()?;
        Ok(Self {
            base: base.cast(),
            model,
            _borrow: PhantomData,
        })
    }
}

impl FieldReader for UnsafeValue<'_> {
    fn field(&self, name: &str) -> OrmResult<Value> {
        let fd = self.model.require_field(name)?;
        // SAFETY: `base` is an exclusive borrow of the model's type, see module docs.
        Ok(unsafe { (fd.read)(self.base.as_ptr().add(fd.offset)) })
    }
}

impl Valuer for UnsafeValue<'_> {
    fn set_columns(&mut self, rows: &Rows) -> OrmResult<()> {
        let indexes = resolve_columns(self.model, rows)?;
        let row = rows.current()?;
        for (index, value) in indexes.into_iter().zip(row.iter().cloned()) {
            let fd = &self.model.fields[index];
            // SAFETY: `base` is an exclusive borrow of the model's type, see module docs.
            unsafe { (fd.write)(self.base.as_ptr().add(fd.offset), value) }
                .map_err(|e| e.with_column(&fd.column))?;
        }
        Ok(())
    }
}
