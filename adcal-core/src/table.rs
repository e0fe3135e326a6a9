//! Calibration table
//!
//! [`CalibrationTable`] owns the store, keeps a RAM mirror of the persisted
//! image and mediates every access to it.
//!
//! ## Reads
//!
//! Reads are served from the mirror and never touch the store. Entry getters
//! use the active scale; the `*_for_scale` variants take one explicitly.
//!
//! ## Writes
//!
//! Every persistent write:
//!
//! 1. checks the calibration gate ([`CalError::AccessDenied`] when locked)
//! 2. validates indices ([`CalError::InvalidIndex`])
//! 3. updates the mirror
//! 4. commits the affected pages, then the checksum page
//!
//! A failed commit restores the mirror to its previous value and returns
//! [`CalError::StoreFailure`]. Nothing is retried. The store may then hold a
//! partially written image, which the next load reports as corrupt; the
//! following successful commit rewrites the whole image.
//!
//! ## Start-up
//!
//! ```text
//! init()
//!   ├─ gate locked, store locked, active scale = default_scale
//!   ├─ store smaller than base_page + IMAGE_PAGES -> Err(StoreTooSmall)
//!   ├─ header erased      -> LoadState::Blank,   defaults
//!   ├─ header/CRC invalid -> LoadState::Corrupt, defaults
//!   └─ image intact       -> LoadState::Loaded
//! ```
//!
//! Defaults are all-zero entries, unity correction factors, 25 °C at every
//! temperature point, an empty serial number and `valid == false`.
//!
//! Until an `init` succeeds the table stays `Uninitialized` and refuses
//! calibration mode with [`CalError::NotLoaded`]. A table that never read the
//! store must not write defaults over it.

use core::mem;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::TableConfig;
use crate::constants::calibration::{CAL_TEMP_POINTS, SERIAL_NUMBER_LEN};
use crate::constants::layout::{CRC_PAGE, IMAGE_PAGES, PAGE_SIZE};
use crate::entries::{CalibrationEntry, ColdJunctionCalibration};
use crate::errors::{CalError, CalResult};
use crate::gate::{CalibrationGate, CalibrationMode};
use crate::image::{Corruption, ImageData, ImageStatus, Region};
use crate::index::EntryKey;
use crate::interpolation::{apply_correction, is_ascending, CorrectionCurve};
use crate::scale::Scale;
use crate::store::{store_failure, NvStore, PageSource, StoreOp};

/// Outcome of the last [`CalibrationTable::init`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LoadState {
    /// `init` has not completed
    #[default]
    Uninitialized,
    /// Image loaded and verified
    Loaded,
    /// Store never written; defaults in effect
    Blank,
    /// Stored image rejected; defaults in effect
    Corrupt(Corruption),
}

impl LoadState {
    /// Whether the mirror holds stored calibration data
    pub fn is_loaded(self) -> bool {
        self == Self::Loaded
    }
}

impl From<ImageStatus> for LoadState {
    fn from(status: ImageStatus) -> Self {
        match status {
            ImageStatus::Blank => Self::Blank,
            ImageStatus::Corrupt(reason) => Self::Corrupt(reason),
            ImageStatus::Intact => Self::Loaded,
        }
    }
}

/// Persistent calibration table over an [`NvStore`]
///
/// ## Example
///
/// ```rust
/// use adcal_core::{
///     adc::{BufferState, Gain, SampleRate},
///     store::MemoryStore,
///     CalibrationTable, EntryKey, LoadState, Scale, TableConfig, IMAGE_PAGES,
/// };
///
/// let mut table = CalibrationTable::new(MemoryStore::<IMAGE_PAGES>::new(), TableConfig::default());
/// assert_eq!(table.init()?, LoadState::Blank);
///
/// let key = EntryKey::new(SampleRate::Sps100, Gain::X2, BufferState::Disabled);
/// table.enter_calibration_mode()?;
/// table.set_offset_calibration(key, Scale::FiveVolt, 0x0000_0123)?;
/// table.exit_calibration_mode();
///
/// assert_eq!(table.offset_calibration(key), 0x0000_0123);
/// # Ok::<(), adcal_core::CalError>(())
/// ```
pub struct CalibrationTable<S: NvStore> {
    store: S,
    config: TableConfig,
    data: ImageData,
    gate: CalibrationGate,
    scale: Scale,
    cold_junction_preview: Option<u32>,
    load_state: LoadState,
    /// Store holds exactly the encoded mirror
    in_sync: bool,
}

impl<S: NvStore> CalibrationTable<S> {
    /// Wrap a store. Nothing is read until [`init`](Self::init).
    pub fn new(store: S, config: TableConfig) -> Self {
        Self {
            store,
            config,
            data: ImageData::default(),
            gate: CalibrationGate::new(),
            scale: config.default_scale,
            cold_junction_preview: None,
            load_state: LoadState::Uninitialized,
            in_sync: false,
        }
    }

    /// Load the mirror from the store
    ///
    /// Blank and corrupt images are not errors: defaults are loaded and the
    /// returned [`LoadState`] says why. An error means the store itself
    /// could not be read; the mirror then holds defaults.
    pub fn init(&mut self) -> CalResult<LoadState> {
        self.gate.lock();
        self.store.lock();
        self.scale = self.config.default_scale;
        self.cold_junction_preview = None;
        self.data = ImageData::default();
        self.in_sync = false;
        self.load_state = LoadState::Uninitialized;

        let available = self.store.page_count();
        match self.config.required_pages() {
            Some(required) if required <= available => {}
            required => {
                let required = required.unwrap_or(usize::MAX);
                log_error!("Calibration store too small: {} pages, need {}", available, required);
                return Err(CalError::StoreTooSmall { required, available });
            }
        }
        log_debug!("Loading calibration image from page {}", self.config.base_page);

        let mut source = PageSource::new(&mut self.store, self.config.base_page);
        let (status, data) = ImageData::decode(&mut source)?;

        match status {
            ImageStatus::Intact => {
                if let Some(data) = data {
                    self.data = data;
                }
                self.in_sync = true;
                log_info!(
                    "Calibration loaded (valid: {}, serial: {})",
                    self.data.valid,
                    self.data.serial.as_str()
                );
            }
            ImageStatus::Blank => {
                log_info!("Calibration store blank, using defaults");
            }
            ImageStatus::Corrupt(reason) => {
                log_warn!("Calibration image rejected ({:?}), using defaults", reason);
            }
        }

        self.load_state = status.into();
        Ok(self.load_state)
    }

    /// Outcome of the last [`init`](Self::init)
    pub fn load_state(&self) -> LoadState {
        self.load_state
    }

    /// Table configuration
    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Mutable access to the underlying store
    ///
    /// Writing through it bypasses the mirror; call [`init`](Self::init)
    /// afterwards to resynchronise.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Give the store back
    pub fn release(self) -> S {
        self.store
    }

    /// Persisted state as currently mirrored
    pub fn image(&self) -> &ImageData {
        &self.data
    }

    // ----- calibration mode -----

    /// Unlock the store and accept writes
    ///
    /// Idempotent. If the store refuses to unlock, the gate stays locked.
    /// Refused with [`CalError::NotLoaded`] until [`init`](Self::init) has
    /// succeeded.
    pub fn enter_calibration_mode(&mut self) -> CalResult<()> {
        if self.load_state == LoadState::Uninitialized {
            log_warn!("Calibration mode refused: table not loaded");
            return Err(CalError::NotLoaded);
        }
        if self.gate.is_unlocked() {
            return Ok(());
        }
        self.store
            .unlock()
            .map_err(|e| store_failure(StoreOp::Unlock, self.config.base_page, e))?;
        self.gate.unlock();
        log_info!("Calibration mode enabled");
        Ok(())
    }

    /// Lock the store and reject writes. Idempotent.
    pub fn exit_calibration_mode(&mut self) {
        if self.gate.lock() {
            self.store.lock();
            log_info!("Calibration mode disabled");
        }
    }

    /// Whether writes are currently accepted
    pub fn is_calibration_mode_enabled(&self) -> bool {
        self.gate.is_unlocked()
    }

    /// Current gate state
    pub fn calibration_mode(&self) -> CalibrationMode {
        self.gate.mode()
    }

    // ----- scale -----

    /// Active scale
    pub fn scale(&self) -> Scale {
        self.scale
    }

    /// Select the active scale
    ///
    /// Not gated and not persisted: it selects which entries the getters
    /// return.
    pub fn set_scale(&mut self, scale: Scale) {
        if scale != self.scale {
            log_debug!("Active scale {:?} -> {:?}", self.scale, scale);
        }
        self.scale = scale;
    }

    // ----- entry reads -----

    /// Entry constants for `key` on the active scale
    pub fn entry(&self, key: EntryKey) -> CalibrationEntry {
        self.entry_for_scale(key, self.scale)
    }

    /// Entry constants for `key` on `scale`
    pub fn entry_for_scale(&self, key: EntryKey, scale: Scale) -> CalibrationEntry {
        self.data.records[key.slot_in(scale)].entry
    }

    /// Gain calibration on the active scale
    pub fn gain_calibration(&self, key: EntryKey) -> u32 {
        self.entry(key).gain
    }

    /// Gain calibration on `scale`
    pub fn gain_calibration_for_scale(&self, key: EntryKey, scale: Scale) -> u32 {
        self.entry_for_scale(key, scale).gain
    }

    /// Offset calibration on the active scale
    pub fn offset_calibration(&self, key: EntryKey) -> u32 {
        self.entry(key).offset
    }

    /// Offset calibration on `scale`
    pub fn offset_calibration_for_scale(&self, key: EntryKey, scale: Scale) -> u32 {
        self.entry_for_scale(key, scale).offset
    }

    /// Base gain calibration on the active scale
    pub fn base_gain_calibration(&self, key: EntryKey) -> u32 {
        self.entry(key).base_gain
    }

    /// Base gain calibration on `scale`
    pub fn base_gain_calibration_for_scale(&self, key: EntryKey, scale: Scale) -> u32 {
        self.entry_for_scale(key, scale).base_gain
    }

    /// Temperature correction curve of `key` on `scale`
    pub fn correction_curve(&self, key: EntryKey, scale: Scale) -> CorrectionCurve<CAL_TEMP_POINTS> {
        let record = &self.data.records[key.slot_in(scale)];
        CorrectionCurve::from_parts(&self.data.temperatures, &record.corrections)
    }

    /// Interpolated gain correction at `temperature` on the active scale
    pub fn gain_correction_factor(&self, key: EntryKey, temperature: f32) -> f32 {
        self.gain_correction_factor_for_scale(key, self.scale, temperature)
    }

    /// Interpolated gain correction at `temperature` on `scale`
    pub fn gain_correction_factor_for_scale(
        &self,
        key: EntryKey,
        scale: Scale,
        temperature: f32,
    ) -> f32 {
        self.correction_curve(key, scale).factor_at(temperature)
    }

    /// Gain calibration corrected for `temperature`, on the active scale
    pub fn corrected_gain(&self, key: EntryKey, temperature: f32) -> u32 {
        self.corrected_gain_for_scale(key, self.scale, temperature)
    }

    /// Gain calibration corrected for `temperature`, on `scale`
    pub fn corrected_gain_for_scale(&self, key: EntryKey, scale: Scale, temperature: f32) -> u32 {
        let raw = self.gain_calibration_for_scale(key, scale);
        apply_correction(raw, self.gain_correction_factor_for_scale(key, scale, temperature))
    }

    // ----- entry writes -----

    /// Set the gain calibration of `key` on `scale`
    pub fn set_gain_calibration(&mut self, key: EntryKey, scale: Scale, value: u32) -> CalResult<()> {
        self.admit("gain")?;
        let slot = key.slot_in(scale);
        self.update(Region::Entry(slot), |d| &mut d.records[slot].entry.gain, value)?;
        log_debug!("Gain {:?}/{:?} = {:#x}", key, scale, value);
        Ok(())
    }

    /// Set the offset calibration of `key` on `scale`
    pub fn set_offset_calibration(&mut self, key: EntryKey, scale: Scale, value: u32) -> CalResult<()> {
        self.admit("offset")?;
        let slot = key.slot_in(scale);
        self.update(Region::Entry(slot), |d| &mut d.records[slot].entry.offset, value)?;
        log_debug!("Offset {:?}/{:?} = {:#x}", key, scale, value);
        Ok(())
    }

    /// Set the base gain calibration of `key` on `scale`
    pub fn set_base_gain_calibration(
        &mut self,
        key: EntryKey,
        scale: Scale,
        value: u32,
    ) -> CalResult<()> {
        self.admit("base gain")?;
        let slot = key.slot_in(scale);
        self.update(Region::Entry(slot), |d| &mut d.records[slot].entry.base_gain, value)?;
        log_debug!("Base gain {:?}/{:?} = {:#x}", key, scale, value);
        Ok(())
    }

    /// Set the gain correction factor of `key` on `scale` at temperature
    /// point `point`
    pub fn set_gain_correction(
        &mut self,
        key: EntryKey,
        scale: Scale,
        point: usize,
        factor: f32,
    ) -> CalResult<()> {
        self.admit("gain correction")?;
        check_point(point)?;
        let slot = key.slot_in(scale);
        self.update(
            Region::Entry(slot),
            |d| &mut d.records[slot].corrections[point],
            factor,
        )
    }

    // ----- cold junction -----

    /// Effective cold-junction constants, preview included
    pub fn cold_junction(&self) -> ColdJunctionCalibration {
        ColdJunctionCalibration {
            offset: self.data.cold_junction.offset,
            gain: self.cold_junction_gain_calibration(),
        }
    }

    /// Cold-junction offset calibration
    pub fn cold_junction_offset_calibration(&self) -> u32 {
        self.data.cold_junction.offset
    }

    /// Cold-junction gain calibration; a pending preview takes precedence
    pub fn cold_junction_gain_calibration(&self) -> u32 {
        self.cold_junction_preview
            .unwrap_or(self.data.cold_junction.gain)
    }

    /// Stored cold-junction gain, ignoring any preview
    pub fn stored_cold_junction_gain_calibration(&self) -> u32 {
        self.data.cold_junction.gain
    }

    /// Set the cold-junction offset calibration
    pub fn set_cold_junction_offset_calibration(&mut self, value: u32) -> CalResult<()> {
        self.admit("cold-junction offset")?;
        self.update(Region::ColdJunction, |d| &mut d.cold_junction.offset, value)
    }

    /// Set the cold-junction gain calibration
    ///
    /// With `persist == false` the value only previews: it is served by the
    /// getter until the next persisted write or `init`, the store is not
    /// touched and the gate is not consulted. With `persist == true` the
    /// write is gated and committed, and any preview is dropped.
    pub fn set_cold_junction_gain_calibration(&mut self, value: u32, persist: bool) -> CalResult<()> {
        if !persist {
            log_debug!("Cold-junction gain preview {:#x}", value);
            self.cold_junction_preview = Some(value);
            return Ok(());
        }
        self.admit("cold-junction gain")?;
        self.update(Region::ColdJunction, |d| &mut d.cold_junction.gain, value)?;
        self.cold_junction_preview = None;
        Ok(())
    }

    /// Drop a pending cold-junction gain preview
    pub fn clear_cold_junction_preview(&mut self) {
        self.cold_junction_preview = None;
    }

    // ----- metadata -----

    /// Board serial number
    pub fn serial_number(&self) -> &str {
        self.data.serial.as_str()
    }

    /// Set the board serial number
    ///
    /// Text after an embedded NUL is dropped. Text longer than
    /// [`SERIAL_NUMBER_LEN`] bytes is truncated on a character boundary.
    pub fn set_serial_number(&mut self, text: &str) -> CalResult<()> {
        self.admit("serial number")?;
        let text = text.split('\0').next().unwrap_or_default();
        let mut end = text.len().min(SERIAL_NUMBER_LEN);
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        if end < text.len() {
            log_warn!("Serial number truncated to {} bytes", end);
        }
        let mut serial = heapless::String::new();
        // Fits: `end` never exceeds the capacity.
        let _ = serial.push_str(&text[..end]);
        self.update(Region::Serial, |d| &mut d.serial, serial)?;
        log_info!("Serial number set to {}", self.data.serial.as_str());
        Ok(())
    }

    /// Whether calibration has been completed and marked valid
    pub fn is_valid(&self) -> bool {
        self.data.valid
    }

    /// Mark the calibration as complete
    ///
    /// Refused with [`CalError::UnorderedTemperatures`] unless the
    /// temperature points are ascending.
    pub fn set_calibration_valid(&mut self) -> CalResult<()> {
        self.admit("validity")?;
        if !self.temperature_points_ordered() {
            log_warn!("Refusing to mark calibration valid: temperatures not ascending");
            return Err(CalError::UnorderedTemperatures);
        }
        self.update(Region::Valid, |d| &mut d.valid, true)?;
        log_info!("Calibration marked valid");
        Ok(())
    }

    /// Temperature of every calibration point (°C)
    pub fn calibration_temperatures(&self) -> &[f32; CAL_TEMP_POINTS] {
        &self.data.temperatures
    }

    /// Temperature of point `point` (°C)
    pub fn calibration_temperature(&self, point: usize) -> CalResult<f32> {
        check_point(point)?;
        Ok(self.data.temperatures[point])
    }

    /// Set the temperature of point `point`
    ///
    /// Points must end up ascending before the table can be marked valid.
    pub fn set_calibration_temperature(&mut self, value: f32, point: usize) -> CalResult<()> {
        self.admit("calibration temperature")?;
        check_point(point)?;
        self.update(Region::Temperatures, |d| &mut d.temperatures[point], value)?;
        log_debug!("Calibration temperature {} = {}", point, value);
        Ok(())
    }

    /// Whether the temperature points are ascending
    pub fn temperature_points_ordered(&self) -> bool {
        is_ascending(&self.data.temperatures)
    }

    // ----- persistence -----

    fn admit(&self, what: &'static str) -> CalResult<()> {
        self.gate.check().map_err(|e| {
            log_warn!("Rejected {} write: calibration mode disabled", what);
            e
        })?;
        if self.load_state == LoadState::Uninitialized {
            log_warn!("Rejected {} write: table not loaded", what);
            return Err(CalError::NotLoaded);
        }
        Ok(())
    }

    /// Replace one field of the mirror and commit it
    ///
    /// On failure the field gets its previous value back.
    fn update<T, F>(&mut self, region: Region, field: F, value: T) -> CalResult<()>
    where
        F: Fn(&mut ImageData) -> &mut T,
    {
        let previous = mem::replace(field(&mut self.data), value);
        if let Err(e) = self.commit(region) {
            *field(&mut self.data) = previous;
            self.in_sync = false;
            log_warn!("Write to {:?} rolled back", region);
            return Err(e);
        }
        Ok(())
    }

    /// Write the pages covering `region`, then the checksum page
    fn commit(&mut self, region: Region) -> CalResult<()> {
        let crc = self.data.checksum();

        if !self.in_sync {
            log_info!("Writing full calibration image ({} pages)", IMAGE_PAGES);
            for page in 0..IMAGE_PAGES {
                self.commit_page(page, crc)?;
            }
            self.in_sync = true;
            return Ok(());
        }

        for page in region.pages() {
            if page != CRC_PAGE {
                self.commit_page(page, crc)?;
            }
        }
        self.commit_page(CRC_PAGE, crc)
    }

    fn commit_page(&mut self, page: usize, crc: u32) -> CalResult<()> {
        let mut buf = [0u8; PAGE_SIZE];
        self.data.encode_page(page, crc, &mut buf);

        let abs = self.config.base_page + page;
        nb::block!(self.store.erase_page(abs))
            .map_err(|e| store_failure(StoreOp::Erase, abs, e))?;
        nb::block!(self.store.program_page(abs, &buf))
            .map_err(|e| store_failure(StoreOp::Program, abs, e))?;
        Ok(())
    }
}

fn check_point(point: usize) -> CalResult<()> {
    if point < CAL_TEMP_POINTS {
        Ok(())
    } else {
        Err(CalError::InvalidIndex { index: point, limit: CAL_TEMP_POINTS })
    }
}
