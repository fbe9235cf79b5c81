//! GPIO interrupt wiring for the position sensors.
//!
//! Both reed switches interrupt on any edge.  The handlers only push a raw
//! edge event to the lock-free queue; debouncing and sampling happen in the
//! control loop.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

/// Errors while installing the sensor interrupts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsrError {
    ServiceInstall(i32),
    HandlerAdd { gpio: i32, rc: i32 },
}

impl core::fmt::Display for IsrError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ServiceInstall(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
            Self::HandlerAdd { gpio, rc } => {
                write!(f, "GPIO{} ISR handler add failed (rc={})", gpio, rc)
            }
        }
    }
}

impl std::error::Error for IsrError {}

#[cfg(target_os = "espidf")]
use crate::events::{push_event, Event};

#[cfg(target_os = "espidf")]
unsafe extern "C" fn closed_sensor_isr(_arg: *mut core::ffi::c_void) {
    push_event(Event::ClosedSensorEdge);
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn open_sensor_isr(_arg: *mut core::ffi::c_void) {
    push_event(Event::OpenSensorEdge);
}

/// Install the per-pin ISR service and hook both sensor pins.
///
/// Call after the pins are configured as inputs and before the event loop.
#[cfg(target_os = "espidf")]
pub fn install_sensor_isrs(closed_gpio: i32, open_gpio: i32) -> Result<(), IsrError> {
    // SAFETY: gpio_install_isr_service is idempotent; ESP_ERR_INVALID_STATE
    // means it was already installed.  The handlers are static functions
    // that only touch the lock-free event queue.
    unsafe {
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK && ret != ESP_ERR_INVALID_STATE {
            return Err(IsrError::ServiceInstall(ret));
        }

        let hooks: [(i32, unsafe extern "C" fn(*mut core::ffi::c_void)); 2] =
            [(closed_gpio, closed_sensor_isr), (open_gpio, open_sensor_isr)];
        for (gpio, handler) in hooks {
            gpio_set_intr_type(gpio, gpio_int_type_t_GPIO_INTR_ANYEDGE);
            let rc = gpio_isr_handler_add(gpio, Some(handler), core::ptr::null_mut());
            if rc != ESP_OK {
                return Err(IsrError::HandlerAdd { gpio, rc });
            }
            gpio_intr_enable(gpio);
        }
    }
    log::info!(
        "isr: sensor interrupts installed (closed=GPIO{}, open=GPIO{})",
        closed_gpio,
        open_gpio
    );
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn install_sensor_isrs(closed_gpio: i32, open_gpio: i32) -> Result<(), IsrError> {
    log::info!(
        "isr(sim): GPIO{} and GPIO{} not hooked",
        closed_gpio,
        open_gpio
    );
    Ok(())
}
