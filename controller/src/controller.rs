// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2024 Oxide Computer Company

//! Implementation of the main controller logic.

use crate::executor::Executor;
use crate::Config;
use crate::DeviceProfile;
use crate::Error;
use crate::Transport;
use crate::Vendor;
use itla_decode::utils::decode_word_with_scale;
use itla_decode::utils::null_terminated;
use itla_decode::Channel;
use itla_decode::Currents;
use itla_decode::Dither;
use itla_decode::FineTuning;
use itla_decode::FineTuningRange;
use itla_decode::FirstChannelFrequency;
use itla_decode::Frequency;
use itla_decode::FrequencyRange;
use itla_decode::Grid;
use itla_decode::Identity;
use itla_decode::LaserFrequency;
use itla_decode::MinimumGrid;
use itla_decode::Monitors;
use itla_decode::ParseFromRegisters;
use itla_decode::Power;
use itla_decode::PowerRange;
use itla_decode::Temperatures;
use itla_decode::Thresholds;
use itla_decode::Waveform;
use itla_decode::POWER_RESOLUTION;
use itla_decode::TEMP_RESOLUTION;
use itla_messages::flags::AlarmTrigger;
use itla_messages::flags::FatalError;
use itla_messages::flags::FatalTrigger;
use itla_messages::flags::ModuleConfig;
use itla_messages::flags::NopStatus;
use itla_messages::flags::ResetEnable;
use itla_messages::flags::SrqTrigger;
use itla_messages::flags::WarningError;
use itla_messages::register::address;
use itla_messages::register::RegisterValue;
use itla_messages::CommandFrame;
use itla_messages::NopErrorKind;
use itla_messages::RegisterAddress;
use slog::debug;
use slog::o;
use slog::warn;
use slog::Logger;
use tokio::sync::Mutex;
use tokio::time::sleep;

/// A type for controlling a single laser module.
///
/// All operations go through one executor, which holds the link for the
/// whole of each register operation, including any NOP polls or extended
/// reads it needs. Operations touching several registers, such as
/// [`Controller::set_frequency`], are not atomic with respect to other
/// operations on the same controller.
#[derive(Debug)]
pub struct Controller<T> {
    config: Config,
    profile: DeviceProfile,
    pub(crate) log: Logger,
    executor: Mutex<Executor<T>>,
}

impl<T: Transport> Controller<T> {
    /// Create a new laser controller talking over `transport`.
    ///
    /// The [`Config`] describes the module, and how patient to be with it.
    pub fn new(config: Config, log: Logger, transport: T) -> Result<Self, Error> {
        if let Err(e) = usdt::register_probes() {
            warn!(log, "failed to register DTrace probes"; "reason" => ?e);
        }
        let profile = config.profile()?;
        debug!(
            log,
            "created laser controller";
            "protocol" => %profile.version(),
            "vendor" => ?profile.vendor(),
            "n_registers" => profile.table().len(),
        );
        let executor = Executor::new(
            log.new(o!("component" => "executor")),
            transport,
            config.poll_interval,
            config.max_pending_polls,
        );
        Ok(Self {
            config,
            profile,
            log,
            executor: Mutex::new(executor),
        })
    }

    /// Return the profile of the module this controller talks to.
    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    async fn execute(&self, command: CommandFrame) -> Result<Vec<u8>, Error> {
        self.executor.lock().await.execute(command).await
    }

    /// Read a register.
    ///
    /// Extended registers return all of their data.
    pub async fn read(&self, register: RegisterAddress) -> Result<RegisterValue, Error> {
        let reader = self.profile.register(register)?.reader();
        let bytes = self.execute(reader.command()).await?;
        Ok(reader.value(bytes))
    }

    /// Read a register by its name.
    pub async fn read_named(&self, name: &str) -> Result<RegisterValue, Error> {
        let register = self.profile.register_by_name(name)?.address;
        self.read(register).await
    }

    /// Write a value to a register.
    ///
    /// Signed registers accept `i16` values and unsigned registers `u16`
    /// values; anything else fails before reaching the module.
    pub async fn write(&self, register: RegisterAddress, value: i32) -> Result<(), Error> {
        let descriptor = self.profile.register(register)?;
        let writer = descriptor
            .writer()
            .ok_or(itla_messages::Error::RegisterNotWritable(register))?;
        let command = writer.command(value)?;
        debug!(
            self.log,
            "writing register";
            "register" => &*descriptor.name,
            "value" => value,
        );
        self.execute(command).await.map(|_| ())
    }

    /// Write a value to a register by its name.
    pub async fn write_named(&self, name: &str, value: i32) -> Result<(), Error> {
        let register = self.profile.register_by_name(name)?.address;
        self.write(register, value).await
    }

    pub(crate) async fn read_word(&self, register: RegisterAddress) -> Result<u16, Error> {
        self.read(register)
            .await?
            .word()
            .ok_or(Error::Decode(itla_decode::Error::ParseFailed))
    }

    pub(crate) async fn write_word(&self, register: RegisterAddress, word: u16) -> Result<(), Error> {
        self.write(register, i32::from(word)).await
    }

    async fn write_signed(&self, register: RegisterAddress, value: i16) -> Result<(), Error> {
        self.write(register, i32::from(value)).await
    }

    /// Read a null-terminated string from an extended register.
    pub async fn read_string(&self, register: RegisterAddress) -> Result<String, Error> {
        let value = self.read(register).await?;
        Ok(null_terminated(&value.bytes))
    }

    /// Read and decode the registers describing `P`.
    ///
    /// The reads are made back-to-back, without other operations on this
    /// controller interleaved.
    pub async fn parse<P: ParseFromRegisters>(&self) -> Result<P, Error> {
        let policy = self.profile.policy();
        let commands = P::reads(policy)
            .into_iter()
            .map(|r| self.profile.register(r).map(|d| d.reader().command()))
            .collect::<Result<Vec<_>, _>>()?;
        let mut reads = Vec::with_capacity(commands.len());
        {
            let mut executor = self.executor.lock().await;
            for command in commands {
                reads.push(executor.execute(command).await?);
            }
        }
        P::parse(policy, reads.iter().map(Vec::as_slice)).map_err(Error::from)
    }

    /// Read the NOP register.
    ///
    /// An error code latched in NOP is returned as a [`Error::Device`]. The
    /// read clears it.
    pub async fn nop(&self) -> Result<NopStatus, Error> {
        let word = self.read_word(address::NOP).await?;
        match NopErrorKind::from_field((word & NopErrorKind::MASK) as u8)? {
            Some(kind) => Err(Error::Device {
                register: address::NOP,
                kind,
            }),
            None => Ok(NopStatus::from_bits_truncate(word)),
        }
    }

    /// Wait until the module reports no pending operations in NOP.
    pub async fn wait(&self) -> Result<(), Error> {
        let max_polls = self.config.max_pending_polls.unwrap_or(usize::MAX);
        let mut attempts = 0;
        loop {
            let status = self.nop().await?;
            if !status.is_pending() {
                return Ok(());
            }
            attempts += 1;
            if attempts >= max_polls {
                return Err(Error::PendingTimeout {
                    register: address::NOP,
                    attempts,
                });
            }
            debug!(
                self.log,
                "waiting on pending operations";
                "pending" => format!("0x{:02x}", status.bits() >> 8),
                "attempts" => attempts,
            );
            if let Some(interval) = self.config.poll_interval {
                sleep(interval).await;
            }
        }
    }

    // Poll until the output state matches `enabled`.
    async fn wait_for_output(&self, enabled: bool) -> Result<(), Error> {
        let max_polls = self.config.max_pending_polls.unwrap_or(usize::MAX);
        let mut attempts = 0;
        while self.is_disabled().await? == enabled {
            attempts += 1;
            if attempts >= max_polls {
                return Err(Error::PendingTimeout {
                    register: address::RES_ENA,
                    attempts,
                });
            }
            if let Some(interval) = self.config.poll_interval {
                sleep(interval).await;
            }
        }
        Ok(())
    }

    /// Wait until the optical output is enabled.
    pub async fn wait_until_enabled(&self) -> Result<(), Error> {
        self.wait_for_output(true).await
    }

    /// Wait until the optical output is disabled.
    pub async fn wait_until_disabled(&self) -> Result<(), Error> {
        self.wait_for_output(false).await
    }

    async fn set_reset_enable(&self, flags: ResetEnable) -> Result<(), Error> {
        self.write_word(address::RES_ENA, flags.bits()).await
    }

    /// Enable the optical output.
    ///
    /// The output takes some time to stabilize after this returns.
    pub async fn enable(&self) -> Result<(), Error> {
        self.set_reset_enable(ResetEnable::SENA).await
    }

    /// Disable the optical output.
    pub async fn disable(&self) -> Result<(), Error> {
        self.set_reset_enable(ResetEnable::empty()).await
    }

    /// Reset the module, as on power-up.
    pub async fn hard_reset(&self) -> Result<(), Error> {
        self.set_reset_enable(ResetEnable::MR).await
    }

    /// Reset the module's control loops, keeping communication state.
    pub async fn soft_reset(&self) -> Result<(), Error> {
        self.set_reset_enable(ResetEnable::SR).await
    }

    pub async fn reset_enable(&self) -> Result<ResetEnable, Error> {
        self.read_word(address::RES_ENA)
            .await
            .map(ResetEnable::from_bits_truncate)
    }

    /// Read the module configuration behavior register.
    pub async fn module_config(&self) -> Result<ModuleConfig, Error> {
        self.read_word(address::MCB)
            .await
            .map(ModuleConfig::from_bits_truncate)
    }

    pub async fn set_module_config(&self, config: ModuleConfig) -> Result<(), Error> {
        self.write_word(address::MCB, config.bits()).await
    }

    async fn update_module_config(&self, flag: ModuleConfig, value: bool) -> Result<(), Error> {
        let mut config = self.module_config().await?;
        config.set(flag, value);
        self.set_module_config(config).await
    }

    /// Set whether the module shuts its output down on a fatal condition.
    pub async fn set_shutdown_on_fatal(&self, enabled: bool) -> Result<(), Error> {
        self.update_module_config(ModuleConfig::SDF, enabled).await
    }

    /// Set whether the module raises alarms while tuning.
    pub async fn set_alarm_during_tuning(&self, enabled: bool) -> Result<(), Error> {
        self.update_module_config(ModuleConfig::ADT, enabled).await
    }

    /// Return true if the optical output is disabled.
    ///
    /// Some lasers never set `DIS` in the fatal status register, even when
    /// FatalT selects it.
    pub async fn is_disabled(&self) -> Result<bool, Error> {
        let fatal = self.fatal_error(false).await?;
        let trigger = self.fatal_trigger().await?;
        let reset_enable = self.reset_enable().await?;
        let config = self.module_config().await?;
        Ok(output_disabled(fatal, trigger, reset_enable, config))
    }

    pub async fn is_enabled(&self) -> Result<bool, Error> {
        self.is_disabled().await.map(|disabled| !disabled)
    }

    /// Read the fatal status register, optionally clearing its latched bits.
    pub async fn fatal_error(&self, reset: bool) -> Result<FatalError, Error> {
        let status = FatalError::from_bits_truncate(self.read_word(address::STATUS_F).await?);
        debug!(self.log, "read fatal status"; "status" => ?status);
        if reset {
            self.write_word(address::STATUS_F, FatalError::LATCHED.bits())
                .await?;
        }
        Ok(status)
    }

    /// Read the warning status register, optionally clearing its latched
    /// bits.
    pub async fn warning_error(&self, reset: bool) -> Result<WarningError, Error> {
        let status = WarningError::from_bits_truncate(self.read_word(address::STATUS_W).await?);
        debug!(self.log, "read warning status"; "status" => ?status);
        if reset {
            self.write_word(address::STATUS_W, WarningError::LATCHED.bits())
                .await?;
        }
        Ok(status)
    }

    pub async fn srq_trigger(&self) -> Result<SrqTrigger, Error> {
        self.read_word(address::SRQ_T)
            .await
            .map(SrqTrigger::from_bits_truncate)
    }

    pub async fn set_srq_trigger(&self, trigger: SrqTrigger) -> Result<(), Error> {
        self.write_word(address::SRQ_T, trigger.bits()).await
    }

    pub async fn fatal_trigger(&self) -> Result<FatalTrigger, Error> {
        self.read_word(address::FATAL_T)
            .await
            .map(FatalTrigger::from_bits_truncate)
    }

    pub async fn set_fatal_trigger(&self, trigger: FatalTrigger) -> Result<(), Error> {
        self.write_word(address::FATAL_T, trigger.bits()).await
    }

    pub async fn alarm_trigger(&self) -> Result<AlarmTrigger, Error> {
        self.read_word(address::ALM_T)
            .await
            .map(AlarmTrigger::from_bits_truncate)
    }

    pub async fn set_alarm_trigger(&self, trigger: AlarmTrigger) -> Result<(), Error> {
        self.write_word(address::ALM_T, trigger.bits()).await
    }

    /// Read the last response the module sent, as it stored it.
    pub async fn last_response(&self) -> Result<u16, Error> {
        self.read_word(address::LAST_RESPONSE).await
    }

    /// Read the identity strings of the module.
    pub async fn identity(&self) -> Result<Identity, Error> {
        self.parse().await
    }

    /// Set the output power, in dBm.
    ///
    /// The module rejects values outside of [`Controller::power_range`].
    pub async fn set_power(&self, dbm: f64) -> Result<(), Error> {
        let value = itla_decode::encode_power(dbm)?;
        match self.write_signed(address::PWR, value).await {
            Err(e @ Error::Device {
                kind: NopErrorKind::ValueRangeError,
                ..
            }) => {
                warn!(
                    self.log,
                    "power setting is out of range for this module";
                    "dbm" => dbm,
                );
                Err(e)
            }
            other => other,
        }
    }

    /// Return the power set point and the measured output power.
    pub async fn power(&self) -> Result<Power, Error> {
        self.parse().await
    }

    /// Return the power set point, in dBm.
    pub async fn power_setting(&self) -> Result<f32, Error> {
        let value = self.read(address::PWR).await?;
        Ok(decode_word_with_scale::<i16>(&value.bytes, POWER_RESOLUTION)?)
    }

    /// Return the measured output power, in dBm.
    ///
    /// This is only an approximation.
    pub async fn output_power(&self) -> Result<f32, Error> {
        let value = self.read(address::OOP).await?;
        Ok(decode_word_with_scale::<i16>(&value.bytes, POWER_RESOLUTION)?)
    }

    pub async fn power_range(&self) -> Result<PowerRange, Error> {
        self.parse().await
    }

    /// Set the first channel frequency.
    ///
    /// This only sets the output frequency when the channel is 1. Most
    /// modules refuse this while the output is enabled.
    pub async fn set_fcf(&self, frequency: Frequency) -> Result<(), Error> {
        if self.profile.vendor() == Vendor::PurePhotonics {
            let range: FrequencyRange = self.parse().await?;
            if !range.contains(frequency) {
                return Err(Error::FrequencyOutOfRange { frequency, range });
            }
        }
        let policy = self.profile.policy();
        let words = frequency.to_words(policy.tuning)?;
        let registers = FirstChannelFrequency::write_registers(policy);
        debug!(
            self.log,
            "setting first channel frequency";
            "frequency" => %frequency,
            "words" => ?words,
        );
        for (register, word) in registers.into_iter().zip(words) {
            self.write_word(register, word).await?;
        }
        Ok(())
    }

    /// Return the first channel frequency.
    pub async fn fcf(&self) -> Result<Frequency, Error> {
        self.parse::<FirstChannelFrequency>().await.map(|f| f.0)
    }

    /// Return the current operating frequency.
    pub async fn frequency(&self) -> Result<Frequency, Error> {
        self.parse::<LaserFrequency>().await.map(|f| f.0)
    }

    pub async fn frequency_range(&self) -> Result<FrequencyRange, Error> {
        self.parse().await
    }

    /// Tune the laser to `frequency`.
    ///
    /// This turns off any fine tuning, sets the first channel frequency, and
    /// selects channel 1. The output should be disabled first.
    pub async fn set_frequency(&self, frequency: Frequency) -> Result<(), Error> {
        let fine: FineTuning = self.parse().await?;
        if !fine.is_zero() {
            debug!(self.log, "turning off fine tuning"; "mhz" => fine.mhz);
            self.set_fine_tuning(FineTuning { mhz: 0 }).await?;
        }
        self.set_fcf(frequency).await?;
        self.set_channel(Channel(1)).await
    }

    /// Set the channel, the number of grid spacings from the first channel
    /// frequency.
    pub async fn set_channel(&self, channel: Channel) -> Result<(), Error> {
        let (low, high) = channel.to_words(self.profile.policy().channel)?;
        self.write_word(address::CHANNEL, low).await?;
        if let Some(high) = high {
            self.write_word(address::CHANNEL_H, high).await?;
        }
        Ok(())
    }

    pub async fn channel(&self) -> Result<Channel, Error> {
        self.parse().await
    }

    /// Set the grid spacing.
    pub async fn set_grid(&self, grid: Grid) -> Result<(), Error> {
        let (tenths, rest) = grid.to_words(self.profile.policy().tuning)?;
        self.write_signed(address::GRID, tenths).await?;
        if let Some(rest) = rest {
            self.write_signed(address::GRID2, rest).await?;
        }
        Ok(())
    }

    pub async fn grid(&self) -> Result<Grid, Error> {
        self.parse().await
    }

    /// Return the smallest grid spacing the module supports.
    pub async fn grid_min(&self) -> Result<Grid, Error> {
        self.parse::<MinimumGrid>().await.map(|g| g.0)
    }

    /// Set the off-grid fine tuning offset, applied to all channels.
    ///
    /// With the output enabled, this stays pending until the offset is
    /// reached.
    pub async fn set_fine_tuning(&self, fine: FineTuning) -> Result<(), Error> {
        self.write_signed(address::FTF, fine.mhz).await
    }

    pub async fn fine_tuning(&self) -> Result<FineTuning, Error> {
        self.parse().await
    }

    pub async fn fine_tuning_range(&self) -> Result<FineTuningRange, Error> {
        self.parse().await
    }

    /// Enable digital dither with the given waveform.
    pub async fn dither_enable(&self, waveform: Waveform) -> Result<(), Error> {
        self.write_word(address::DITHER_E, waveform.enable_word())
            .await
    }

    pub async fn dither_disable(&self) -> Result<(), Error> {
        self.write_word(address::DITHER_E, 0).await
    }

    pub async fn dither(&self) -> Result<Dither, Error> {
        self.parse().await
    }

    /// Return the dither rate, in kHz.
    pub async fn dither_rate(&self) -> Result<u16, Error> {
        self.read_word(address::DITHER_R).await
    }

    /// Set the dither rate, in kHz.
    pub async fn set_dither_rate(&self, rate: u16) -> Result<(), Error> {
        self.write_word(address::DITHER_R, rate).await
    }

    pub async fn dither_frequency(&self) -> Result<u16, Error> {
        self.read_word(address::DITHER_F).await
    }

    /// Set the dither FM deviation, in units of 0.1 GHz.
    pub async fn set_dither_frequency(&self, frequency: u16) -> Result<(), Error> {
        self.write_word(address::DITHER_F, frequency).await
    }

    pub async fn dither_amplitude(&self) -> Result<u16, Error> {
        self.read_word(address::DITHER_A).await
    }

    /// Set the dither AM deviation, in units of 0.1% of the output power.
    pub async fn set_dither_amplitude(&self, amplitude: u16) -> Result<(), Error> {
        self.write_word(address::DITHER_A, amplitude).await
    }

    /// Return the primary control temperature, in degrees C.
    pub async fn temperature(&self) -> Result<f32, Error> {
        let value = self.read(address::CTEMP).await?;
        Ok(decode_word_with_scale::<i16>(&value.bytes, TEMP_RESOLUTION)?)
    }

    /// Return the laser age, as a percentage of its end of life.
    pub async fn age(&self) -> Result<u16, Error> {
        self.read_word(address::AGE).await
    }

    pub async fn monitors(&self) -> Result<Monitors, Error> {
        self.parse().await
    }

    pub async fn temperatures(&self) -> Result<Temperatures, Error> {
        self.parse().await
    }

    pub async fn currents(&self) -> Result<Currents, Error> {
        self.parse().await
    }

    pub async fn thresholds(&self) -> Result<Thresholds, Error> {
        self.parse().await
    }
}

// Whether the output is disabled, given the status, trigger, and
// configuration registers.
fn output_disabled(
    fatal: FatalError,
    trigger: FatalTrigger,
    reset_enable: ResetEnable,
    config: ModuleConfig,
) -> bool {
    (trigger.fires_on(fatal) && config.contains(ModuleConfig::SDF))
        || !reset_enable.contains(ResetEnable::SENA)
        || !fatal.contains(FatalError::DIS)
}

#[cfg(test)]
mod tests {
    use super::output_disabled;
    use crate::test_utils::controller_with;
    use crate::test_utils::extended_read;
    use crate::test_utils::failed;
    use crate::test_utils::nop_code;
    use crate::test_utils::nop_error;
    use crate::test_utils::ok;
    use crate::test_utils::pending;
    use crate::test_utils::Exchange;
    use crate::ConfigBuilder;
    use crate::Error;
    use crate::Vendor;
    use itla_decode::Channel;
    use itla_decode::Frequency;
    use itla_decode::Grid;
    use itla_decode::Waveform;
    use itla_messages::flags::FatalError;
    use itla_messages::flags::FatalTrigger;
    use itla_messages::flags::ModuleConfig;
    use itla_messages::flags::ResetEnable;
    use itla_messages::register::address;
    use itla_messages::CommandFrame;
    use itla_messages::NopErrorKind;
    use itla_messages::ProtocolVersion;
    use std::time::Duration;

    fn read(register: u8, word: u16) -> Exchange {
        Exchange::new(CommandFrame::read(register), ok(register, word))
    }

    fn write(register: u8, word: u16) -> Exchange {
        Exchange::new(CommandFrame::write(register, word), ok(register, word))
    }

    fn config(vendor: Vendor, protocol: ProtocolVersion) -> crate::Config {
        ConfigBuilder::new(vendor)
            .protocol(protocol)
            .response_timeout(Duration::from_millis(50))
            .no_poll_interval()
            .max_pending_polls(8)
            .build()
            .unwrap()
    }

    fn msa13() -> crate::Config {
        config(Vendor::Generic, ProtocolVersion::Msa13)
    }

    #[tokio::test]
    async fn test_named_register_access() {
        let script = vec![
            write(address::PWR, (-150i16) as u16),
            read(address::PWR, (-150i16) as u16),
            read(address::CHANNEL, 0xfffe),
        ];
        let (controller, laser) = controller_with(msa13(), script);
        controller.write_named("pwr", -150).await.unwrap();
        assert_eq!(controller.read_named("PWR").await.unwrap().value(), Some(-150));
        assert_eq!(
            controller.read(address::CHANNEL).await.unwrap().value(),
            Some(0xfffe)
        );
        assert_eq!(laser.await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_write_rejected_before_reaching_module() {
        let (controller, laser) = controller_with(msa13(), vec![]);
        assert!(matches!(
            controller.write(address::OOP, 1).await,
            Err(Error::Protocol(itla_messages::Error::RegisterNotWritable(
                address::OOP
            )))
        ));
        assert!(matches!(
            controller.write(address::PWR, 40_000).await,
            Err(Error::Protocol(itla_messages::Error::ValueOutOfRange { .. }))
        ));
        assert!(matches!(
            controller.write(address::CHANNEL, -1).await,
            Err(Error::Protocol(itla_messages::Error::ValueOutOfRange { .. }))
        ));
        assert!(matches!(
            controller.read_named("NotARegister").await,
            Err(Error::UnknownRegister(_))
        ));
        assert!(matches!(
            controller.read(0xfe).await,
            Err(Error::UnknownRegister(_))
        ));
        assert!(laser.await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_identity() {
        let strings: [(u8, &[u8]); 7] = [
            (address::DEVICE_TYPE, b"CW ITLA\0"),
            (address::MANUFACTURER, b"PURE Photonics\0\0"),
            (address::MODEL, b"PPCL600\0"),
            (address::SERIAL_NUMBER, b"CRTNHBM047\0"),
            (address::MANUFACTURING_DATE, b"03/25/2019\0\0"),
            (address::RELEASE, b"2.3.1\0"),
            (address::RELEASE_BACKWARDS, b"2.0\0"),
        ];
        let script = strings
            .iter()
            .flat_map(|(register, bytes)| extended_read(*register, bytes))
            .collect();
        let (controller, _laser) = controller_with(msa13(), script);
        let ident = controller.identity().await.unwrap();
        assert_eq!(ident.manufacturer, "PURE Photonics");
        assert_eq!(ident.model, "PPCL600");
        assert_eq!(ident.release_backwards, "2.0");
    }

    #[tokio::test]
    async fn test_nop_and_wait() {
        let nop = CommandFrame::read(address::NOP);
        let script = vec![
            Exchange::new(nop, nop_error(NopErrorKind::CommandIgnoredOutputEnabled)),
            Exchange::new(nop, nop_code(0x0110)),
            Exchange::new(nop, nop_code(0x0010)),
        ];
        let (controller, laser) = controller_with(msa13(), script);
        let err = controller.nop().await.unwrap_err();
        assert_eq!(
            err.device_kind(),
            Some(NopErrorKind::CommandIgnoredOutputEnabled)
        );
        controller.wait().await.unwrap();
        assert_eq!(laser.await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_fatal_error_reset() {
        let script = vec![
            read(address::STATUS_F, 0x1081),
            write(address::STATUS_F, 0x00ff),
        ];
        let (controller, laser) = controller_with(msa13(), script);
        let status = controller.fatal_error(true).await.unwrap();
        assert!(status.contains(FatalError::DIS));
        assert!(status.contains(FatalError::FPWR));
        assert!(status.contains(FatalError::XEL));
        laser.await.unwrap();
    }

    #[test]
    fn test_output_disabled() {
        let enabled = ResetEnable::SENA;
        let sdf = ModuleConfig::SDF;
        assert!(!output_disabled(
            FatalError::DIS,
            FatalTrigger::empty(),
            enabled,
            sdf
        ));
        assert!(output_disabled(
            FatalError::DIS,
            FatalTrigger::empty(),
            ResetEnable::empty(),
            sdf
        ));
        assert!(output_disabled(
            FatalError::DIS | FatalError::FPWR,
            FatalTrigger::FPWRL,
            enabled,
            sdf
        ));
        assert!(!output_disabled(
            FatalError::DIS | FatalError::FPWR,
            FatalTrigger::FPWRL,
            enabled,
            ModuleConfig::empty()
        ));
        assert!(output_disabled(
            FatalError::empty(),
            FatalTrigger::empty(),
            enabled,
            sdf
        ));
    }

    #[tokio::test]
    async fn test_is_disabled_reads_status() {
        let script = vec![
            read(address::STATUS_F, FatalError::DIS.bits()),
            read(address::FATAL_T, 0),
            read(address::RES_ENA, ResetEnable::SENA.bits()),
            read(address::MCB, ModuleConfig::SDF.bits()),
        ];
        let (controller, laser) = controller_with(msa13(), script);
        assert!(controller.is_enabled().await.unwrap());
        assert_eq!(laser.await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_is_disabled_conditions() {
        let sdf = ModuleConfig::SDF;
        let sena = ResetEnable::SENA;
        let cases = [
            // A trigger sharing a bit with StatusF shuts down with SDF set.
            (FatalError::DIS | FatalError::FPWR, FatalTrigger::FPWRL, sena, sdf, true),
            (
                FatalError::DIS | FatalError::FPWR,
                FatalTrigger::FPWRL,
                sena,
                ModuleConfig::empty(),
                false,
            ),
            // StatusF's FPWRL is bit 8, which FatalT's FPWRL does not select.
            (FatalError::DIS | FatalError::FPWRL, FatalTrigger::FPWRL, sena, sdf, false),
            // Output not enabled.
            (FatalError::DIS, FatalTrigger::empty(), ResetEnable::empty(), sdf, true),
            // DIS clear in StatusF.
            (FatalError::empty(), FatalTrigger::empty(), sena, sdf, true),
            (FatalError::DIS, FatalTrigger::FTHERML, sena, sdf, false),
        ];
        for (status, trigger, reset_enable, config, expected) in cases {
            let script = vec![
                read(address::STATUS_F, status.bits()),
                read(address::FATAL_T, trigger.bits()),
                read(address::RES_ENA, reset_enable.bits()),
                read(address::MCB, config.bits()),
            ];
            let (controller, laser) = controller_with(msa13(), script);
            assert_eq!(
                controller.is_disabled().await.unwrap(),
                expected,
                "status {status:?}, trigger {trigger:?}, \
                 reset_enable {reset_enable:?}, config {config:?}",
            );
            assert_eq!(laser.await.unwrap().len(), 4);
        }
    }

    #[tokio::test]
    async fn test_set_shutdown_on_fatal_preserves_other_bits() {
        let script = vec![
            read(address::MCB, ModuleConfig::ADT.bits()),
            write(address::MCB, (ModuleConfig::ADT | ModuleConfig::SDF).bits()),
        ];
        let (controller, laser) = controller_with(msa13(), script);
        controller.set_shutdown_on_fatal(true).await.unwrap();
        laser.await.unwrap();
    }

    #[tokio::test]
    async fn test_enable_disable() {
        let script = vec![
            write(address::RES_ENA, ResetEnable::SENA.bits()),
            write(address::RES_ENA, 0),
            write(address::RES_ENA, ResetEnable::SR.bits()),
        ];
        let (controller, laser) = controller_with(msa13(), script);
        controller.enable().await.unwrap();
        controller.disable().await.unwrap();
        controller.soft_reset().await.unwrap();
        laser.await.unwrap();
    }

    #[tokio::test]
    async fn test_power() {
        let script = vec![
            write(address::PWR, 1350),
            read(address::PWR, 1350),
            read(address::OOP, (-250i16) as u16),
            Exchange::new(
                CommandFrame::write(address::PWR, 3000),
                failed(address::PWR),
            ),
            Exchange::new(
                CommandFrame::read(address::NOP),
                nop_error(NopErrorKind::ValueRangeError),
            ),
        ];
        let (controller, laser) = controller_with(msa13(), script);
        controller.set_power(13.5).await.unwrap();
        let power = controller.power().await.unwrap();
        assert!((power.setting - 13.5).abs() < 1e-4);
        assert!((power.output + 2.5).abs() < 1e-4);
        let err = controller.set_power(30.0).await.unwrap_err();
        assert_eq!(err.device_kind(), Some(NopErrorKind::ValueRangeError));
        laser.await.unwrap();
    }

    #[tokio::test]
    async fn test_set_frequency_three_word() {
        // 193.414489 THz, with fine tuning on and FCF3 pending once.
        let nop = CommandFrame::read(address::NOP);
        let script = vec![
            read(address::FTF, 250),
            write(address::FTF, 0),
            write(address::FCF1, 193),
            write(address::FCF2, 4144),
            Exchange::new(
                CommandFrame::write(address::FCF3, 89),
                pending(address::FCF3),
            ),
            Exchange::new(nop, nop_code(0x0010)),
            write(address::CHANNEL, 1),
            write(address::CHANNEL_H, 0),
        ];
        let (controller, laser) = controller_with(msa13(), script);
        controller
            .set_frequency(Frequency::from_mhz(193_414_489))
            .await
            .unwrap();
        assert_eq!(laser.await.unwrap().len(), 8);
    }

    #[tokio::test]
    async fn test_set_frequency_pure_photonics() {
        let script = vec![
            read(address::FTF, 0),
            // Tuning range: 191.5 THz to 196.25 THz.
            read(address::LFL1, 191),
            read(address::LFL2, 5000),
            read(address::LFL3, 0),
            read(address::LFH1, 196),
            read(address::LFH2, 2500),
            read(address::LFH3, 0),
            write(address::FCF1, 193),
            write(address::FCF2, 4144),
            write(address::CHANNEL, 1),
        ];
        let (controller, laser) =
            controller_with(config(Vendor::PurePhotonics, ProtocolVersion::Msa13), script);
        controller
            .set_frequency(Frequency::from_mhz(193_414_489))
            .await
            .unwrap();
        assert_eq!(laser.await.unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_set_fcf_out_of_range_pure_photonics() {
        let script = vec![
            read(address::LFL1, 191),
            read(address::LFL2, 5000),
            read(address::LFL3, 0),
            read(address::LFH1, 196),
            read(address::LFH2, 2500),
            read(address::LFH3, 0),
        ];
        let (controller, laser) =
            controller_with(config(Vendor::PurePhotonics, ProtocolVersion::Msa13), script);
        let err = controller
            .set_fcf(Frequency::from_mhz(190_000_000))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::FrequencyOutOfRange { .. }));
        assert_eq!(laser.await.unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_channel_width() {
        let script = vec![read(address::CHANNEL, 0x0002), read(address::CHANNEL_H, 0x0001)];
        let (controller, _laser) = controller_with(msa13(), script);
        assert_eq!(controller.channel().await.unwrap(), Channel(0x0001_0002));

        let (controller, laser) =
            controller_with(config(Vendor::Generic, ProtocolVersion::Msa12), vec![]);
        assert!(matches!(
            controller.set_channel(Channel(0x0001_0000)).await,
            Err(Error::Decode(itla_decode::Error::ChannelOutOfRange { .. }))
        ));
        assert!(laser.await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_grid() {
        let script = vec![write(address::GRID, 500), write(address::GRID2, 25)];
        let (controller, laser) = controller_with(msa13(), script);
        controller
            .set_grid(Grid::from_ghz(50.025).unwrap())
            .await
            .unwrap();
        laser.await.unwrap();
    }

    #[tokio::test]
    async fn test_dither() {
        let script = vec![
            write(address::DITHER_E, 0x0012),
            read(address::DITHER_E, 0x0012),
            read(address::DITHER_R, 10),
            read(address::DITHER_F, 5),
            read(address::DITHER_A, 20),
        ];
        let (controller, laser) = controller_with(msa13(), script);
        controller.dither_enable(Waveform::Triangle).await.unwrap();
        let dither = controller.dither().await.unwrap();
        assert!(dither.enabled);
        assert_eq!(dither.waveform, Waveform::Triangle);
        assert_eq!(dither.amplitude, 20);
        laser.await.unwrap();
    }

    #[tokio::test]
    async fn test_extended_monitors() {
        let mut script = extended_read(address::TEMPS, &[0x09, 0xc4, 0x0b, 0xb8]);
        script.push(read(address::CTEMP, 3512));
        let (controller, _laser) = controller_with(msa13(), script);
        let temps = controller.temperatures().await.unwrap();
        assert_eq!(temps.0.len(), 2);
        assert!((temps.0[1] - 30.0).abs() < 1e-4);
        assert!((controller.temperature().await.unwrap() - 35.12).abs() < 1e-4);
    }
}
