//! USB HID keyboard + mouse for the ATmega32U4.
//!
//! One HID interface with one interrupt IN endpoint carries both reports,
//! told apart by report ID (1 = keyboard, 2 = mouse). Direct register access
//! via avr-device; enumeration is serviced by `poll`, which the main loop's
//! delay calls every millisecond.

use core::cell::RefCell;

use avr_device::atmega32u4::Peripherals;
use footboard_core::report::{KeyboardReport, MouseReport};
use footboard_core::{HardwareFault, HidSink, Keycode, MouseButton};

const EP0_SIZE: u8 = 64; // Control endpoint size
const EP1_SIZE: u8 = 16; // Interrupt IN endpoint size (largest report is 9 bytes)

/// Spins on RWAL before giving up on a report (~20 ms at 16 MHz).
const EP1_READY_SPINS: u16 = 0xFFFF;

/// HID report descriptor: keyboard (ID 1) followed by mouse (ID 2).
static HID_REPORT_DESCRIPTOR: [u8; 102] = [
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x06, // Usage (Keyboard)
    0xA1, 0x01, // Collection (Application)
    0x85, 0x01, //   Report ID (1)
    // Modifier keys (8 bits)
    0x05, 0x07, //   Usage Page (Key Codes)
    0x19, 0xE0, //   Usage Minimum (224) - LCtrl
    0x29, 0xE7, //   Usage Maximum (231) - RGui
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x75, 0x01, //   Report Size (1)
    0x95, 0x08, //   Report Count (8)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    // Reserved byte
    0x95, 0x01, //   Report Count (1)
    0x75, 0x08, //   Report Size (8)
    0x81, 0x01, //   Input (Constant)
    // Keycodes (6 bytes)
    0x95, 0x06, //   Report Count (6)
    0x75, 0x08, //   Report Size (8)
    0x15, 0x00, //   Logical Minimum (0)
    0x26, 0xFF, 0x00, // Logical Maximum (255)
    0x05, 0x07, //   Usage Page (Key Codes)
    0x19, 0x00, //   Usage Minimum (0)
    0x29, 0xFF, //   Usage Maximum (255)
    0x81, 0x00, //   Input (Data, Array)
    0xC0, // End Collection
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x02, // Usage (Mouse)
    0xA1, 0x01, // Collection (Application)
    0x85, 0x02, //   Report ID (2)
    0x09, 0x01, //   Usage (Pointer)
    0xA1, 0x00, //   Collection (Physical)
    // Buttons 1-3 (3 bits + 5 padding)
    0x05, 0x09, //     Usage Page (Button)
    0x19, 0x01, //     Usage Minimum (1)
    0x29, 0x03, //     Usage Maximum (3)
    0x15, 0x00, //     Logical Minimum (0)
    0x25, 0x01, //     Logical Maximum (1)
    0x95, 0x03, //     Report Count (3)
    0x75, 0x01, //     Report Size (1)
    0x81, 0x02, //     Input (Data, Variable, Absolute)
    0x95, 0x01, //     Report Count (1)
    0x75, 0x05, //     Report Size (5)
    0x81, 0x01, //     Input (Constant)
    // X, Y, wheel (relative, signed bytes)
    0x05, 0x01, //     Usage Page (Generic Desktop)
    0x09, 0x30, //     Usage (X)
    0x09, 0x31, //     Usage (Y)
    0x09, 0x38, //     Usage (Wheel)
    0x15, 0x81, //     Logical Minimum (-127)
    0x25, 0x7F, //     Logical Maximum (127)
    0x75, 0x08, //     Report Size (8)
    0x95, 0x03, //     Report Count (3)
    0x81, 0x06, //     Input (Data, Variable, Relative)
    0xC0, //   End Collection
    0xC0, // End Collection
];

// USB descriptors
static DEVICE_DESCRIPTOR: [u8; 18] = [
    18,   // bLength
    1,    // bDescriptorType (Device)
    0x00, 0x02, // bcdUSB (2.0)
    0,    // bDeviceClass (defined at interface level)
    0,    // bDeviceSubClass
    0,    // bDeviceProtocol
    EP0_SIZE, // bMaxPacketSize0
    0xC0, 0x16, // idVendor (0x16C0, Van Ooijen Technische Informatica)
    0xDB, 0x27, // idProduct (0x27DB, shared keyboard/mouse PID)
    0x01, 0x00, // bcdDevice (1.0)
    1,    // iManufacturer
    2,    // iProduct
    0,    // iSerialNumber
    1,    // bNumConfigurations
];

static CONFIG_DESCRIPTOR: [u8; 34] = [
    // Configuration descriptor
    9,    // bLength
    2,    // bDescriptorType (Configuration)
    34, 0, // wTotalLength
    1,    // bNumInterfaces
    1,    // bConfigurationValue
    0,    // iConfiguration
    0x80, // bmAttributes (bus powered)
    50,   // bMaxPower (100mA)
    // Interface descriptor
    9,    // bLength
    4,    // bDescriptorType (Interface)
    0,    // bInterfaceNumber
    0,    // bAlternateSetting
    1,    // bNumEndpoints
    3,    // bInterfaceClass (HID)
    0,    // bInterfaceSubClass (none: report IDs rule out the boot protocol)
    0,    // bInterfaceProtocol
    0,    // iInterface
    // HID descriptor
    9,    // bLength
    0x21, // bDescriptorType (HID)
    0x11, 0x01, // bcdHID (1.11)
    0,    // bCountryCode
    1,    // bNumDescriptors
    0x22, // bDescriptorType (Report)
    HID_REPORT_DESCRIPTOR.len() as u8, 0, // wDescriptorLength
    // Endpoint descriptor (EP1 IN, interrupt)
    7,    // bLength
    5,    // bDescriptorType (Endpoint)
    0x81, // bEndpointAddress (EP1 IN)
    0x03, // bmAttributes (Interrupt)
    EP1_SIZE, 0, // wMaxPacketSize
    1,    // bInterval (1ms polling, so press/release pairs go out back to back)
];

/// Build a UTF-16LE string descriptor from ASCII.
const fn string_descriptor<const N: usize>(text: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out[0] = N as u8;
    out[1] = 3;
    let mut i = 0;
    while i < text.len() {
        out[2 + 2 * i] = text[i];
        i += 1;
    }
    out
}

/// String descriptor 0 (language ID)
static STRING_DESC_0: [u8; 4] = [4, 3, 0x09, 0x04]; // English (US)

static STRING_DESC_MANUFACTURER: [u8; 20] = string_descriptor(b"Footboard");

static STRING_DESC_PRODUCT: [u8; 26] = string_descriptor(b"3-Button HID");

/// USB device state plus the keys currently held down.
pub struct UsbHid {
    configured: bool,
    keyboard: KeyboardReport,
}

impl UsbHid {
    pub const fn new() -> Self {
        Self {
            configured: false,
            keyboard: KeyboardReport::empty(),
        }
    }

    /// Initialize the ATmega32U4 USB controller.
    pub fn init(&mut self, dp: &Peripherals) {
        let usb = &dp.USB_DEVICE;

        // Enable USB pad regulator
        usb.uhwcon.write(|w| w.uvrege().set_bit());

        // Enable USB controller and VBUS pad
        usb.usbcon
            .write(|w| w.usbe().set_bit().otgpade().set_bit());

        // PLL: 16MHz crystal -> 48MHz USB clock
        dp.PLL.pllcsr.write(|w| w.pindiv().set_bit().plle().set_bit());
        while dp.PLL.pllcsr.read().plock().bit_is_clear() {}

        // Enable USB clock and attach
        usb.usbcon.modify(|_, w| w.frzclk().clear_bit());
        usb.udcon.modify(|_, w| w.detach().clear_bit());

        usb.udien.write(|w| w.eorste().set_bit());

        self.configured = false;
    }

    /// Handle bus reset and control requests.
    pub fn poll(&mut self, dp: &Peripherals) {
        let usb = &dp.USB_DEVICE;

        if usb.udint.read().eorsti().bit_is_set() {
            usb.udint.modify(|_, w| w.eorsti().clear_bit());
            self.configure_ep0(dp);
            self.configured = false;
            self.keyboard = KeyboardReport::empty();
        }

        self.select_endpoint(dp, 0);
        if usb.ueintx.read().rxstpi().bit_is_set() {
            self.handle_setup(dp);
        }
    }

    /// Mark `key` held and send the keyboard report.
    ///
    /// The local report only changes once the host has it, so a failed
    /// send leaves both sides agreeing on which keys are down.
    pub fn press_key(&mut self, dp: &Peripherals, key: Keycode) -> Result<(), HardwareFault> {
        let Some(next) = self.keyboard.pressing(key) else {
            log::warn!("rollover full, dropping {}", key);
            return Ok(());
        };
        self.write_report(dp, &next.to_bytes())?;
        self.keyboard = next;
        Ok(())
    }

    /// Let go of `key`. On a failed send the key stays held locally, so the
    /// next keyboard report still carries it and a later release clears it.
    pub fn release_key(&mut self, dp: &Peripherals, key: Keycode) -> Result<(), HardwareFault> {
        let next = self.keyboard.releasing(key);
        self.write_report(dp, &next.to_bytes())?;
        self.keyboard = next;
        Ok(())
    }

    /// Button down report immediately followed by all-up.
    pub fn click(&mut self, dp: &Peripherals, button: MouseButton) -> Result<(), HardwareFault> {
        self.write_report(dp, &MouseReport::pressed(button).to_bytes())?;
        self.write_report(dp, &MouseReport::released().to_bytes())
    }

    fn write_report(&mut self, dp: &Peripherals, bytes: &[u8]) -> Result<(), HardwareFault> {
        if !self.configured {
            return Err(HardwareFault::HidUnavailable);
        }

        let usb = &dp.USB_DEVICE;
        self.select_endpoint(dp, 1);

        // Wait for endpoint ready (RWAL set means we can write)
        let mut spins = EP1_READY_SPINS;
        while usb.ueintx.read().rwal().bit_is_clear() {
            spins -= 1;
            if spins == 0 {
                return Err(HardwareFault::HidTimeout);
            }
        }

        for &byte in bytes {
            usb.uedatx.write(|w| w.bits(byte));
        }

        // Clear FIFOCON and TXINI to send
        usb.ueintx
            .modify(|_, w| w.fifocon().clear_bit().txini().clear_bit());
        Ok(())
    }

    fn configure_ep0(&self, dp: &Peripherals) {
        let usb = &dp.USB_DEVICE;

        self.select_endpoint(dp, 0);
        // Control endpoint, 64 bytes
        usb.ueconx.write(|w| w.epen().set_bit());
        usb.uecfg0x.write(|w| w.eptype().bits(0b00));
        usb.uecfg1x.write(|w| w.epsize().bits(0b011).alloc().set_bit());
    }

    fn configure_ep1(&self, dp: &Peripherals) {
        let usb = &dp.USB_DEVICE;

        self.select_endpoint(dp, 1);
        usb.ueconx.write(|w| w.epen().set_bit());
        // Interrupt IN endpoint, 16 bytes
        usb.uecfg0x
            .write(|w| w.eptype().bits(0b11).epdir().set_bit());
        usb.uecfg1x.write(|w| w.epsize().bits(0b001).alloc().set_bit());
    }

    fn select_endpoint(&self, dp: &Peripherals, ep: u8) {
        dp.USB_DEVICE
            .uenum
            .write(|w| w.bits(ep & 0x07));
    }

    fn handle_setup(&mut self, dp: &Peripherals) {
        let usb = &dp.USB_DEVICE;

        // 8-byte SETUP packet
        let bm_request_type = usb.uedatx.read().bits();
        let b_request = usb.uedatx.read().bits();
        let w_value_l = usb.uedatx.read().bits();
        let w_value_h = usb.uedatx.read().bits();
        let _w_index_l = usb.uedatx.read().bits();
        let _w_index_h = usb.uedatx.read().bits();
        let w_length_l = usb.uedatx.read().bits();
        let w_length_h = usb.uedatx.read().bits();

        usb.ueintx.modify(|_, w| w.rxstpi().clear_bit());

        let w_length = (w_length_h as u16) << 8 | w_length_l as u16;

        match (bm_request_type, b_request) {
            // GET_DESCRIPTOR
            (0x80, 0x06) => match (w_value_h, w_value_l) {
                (1, _) => self.send_descriptor(dp, &DEVICE_DESCRIPTOR, w_length),
                (2, _) => self.send_descriptor(dp, &CONFIG_DESCRIPTOR, w_length),
                (3, 0) => self.send_descriptor(dp, &STRING_DESC_0, w_length),
                (3, 1) => self.send_descriptor(dp, &STRING_DESC_MANUFACTURER, w_length),
                (3, 2) => self.send_descriptor(dp, &STRING_DESC_PRODUCT, w_length),
                _ => self.stall(dp),
            },

            // SET_ADDRESS
            (0x00, 0x05) => {
                // ZLP first, then latch the address
                usb.ueintx.modify(|_, w| w.txini().clear_bit());
                while usb.ueintx.read().txini().bit_is_clear() {}
                usb.udaddr
                    .write(|w| w.uadd().bits(w_value_l & 0x7F).adden().set_bit());
            }

            // SET_CONFIGURATION
            (0x00, 0x09) => {
                usb.ueintx.modify(|_, w| w.txini().clear_bit());
                self.configure_ep1(dp);
                self.configured = true;
                log::info!("USB configured");
            }

            // GET_CONFIGURATION
            (0x80, 0x08) => {
                while usb.ueintx.read().txini().bit_is_clear() {}
                usb.uedatx
                    .write(|w| w.bits(if self.configured { 1 } else { 0 }));
                usb.ueintx.modify(|_, w| w.txini().clear_bit());
            }

            // HID GET_DESCRIPTOR (interface-level)
            (0x81, 0x06) => match w_value_h {
                0x22 => self.send_descriptor(dp, &HID_REPORT_DESCRIPTOR, w_length),
                _ => self.stall(dp),
            },

            // HID SET_IDLE, HID SET_PROTOCOL: acknowledge with a ZLP
            (0x21, 0x0A) | (0x21, 0x0B) => {
                usb.ueintx.modify(|_, w| w.txini().clear_bit());
            }

            // Vendor request: jump to bootloader
            (0x40, 0xFF) => {
                usb.ueintx.modify(|_, w| w.txini().clear_bit());
                log::info!("rebooting into bootloader");
                jump_to_bootloader(dp);
            }

            _ => self.stall(dp),
        }
    }

    fn send_descriptor(&self, dp: &Peripherals, desc: &[u8], max_length: u16) {
        let usb = &dp.USB_DEVICE;
        let len = core::cmp::min(desc.len(), max_length as usize);
        let mut sent = 0;

        while sent < len {
            while usb.ueintx.read().txini().bit_is_clear() {}

            let chunk_end = core::cmp::min(sent + EP0_SIZE as usize, len);
            for &byte in &desc[sent..chunk_end] {
                usb.uedatx.write(|w| w.bits(byte));
            }

            usb.ueintx.modify(|_, w| w.txini().clear_bit());
            sent = chunk_end;
        }

        // Status stage (host sends ZLP)
        while usb.ueintx.read().rxouti().bit_is_clear() {}
        usb.ueintx.modify(|_, w| w.rxouti().clear_bit());
    }

    fn stall(&self, dp: &Peripherals) {
        dp.USB_DEVICE
            .ueconx
            .modify(|_, w| w.stallrq().set_bit());
    }
}

/// The core's view of the USB device. Shares the driver with the delay,
/// which polls it between reports.
pub struct HidHandle<'a> {
    usb: &'a RefCell<UsbHid>,
    dp: &'a Peripherals,
}

impl<'a> HidHandle<'a> {
    pub fn new(usb: &'a RefCell<UsbHid>, dp: &'a Peripherals) -> Self {
        Self { usb, dp }
    }

    fn with_usb<T>(
        &mut self,
        f: impl FnOnce(&mut UsbHid, &Peripherals) -> Result<T, HardwareFault>,
    ) -> Result<T, HardwareFault> {
        let mut usb = self
            .usb
            .try_borrow_mut()
            .map_err(|_| HardwareFault::HidUnavailable)?;
        f(&mut usb, self.dp)
    }
}

impl HidSink for HidHandle<'_> {
    fn mouse_click(&mut self, button: MouseButton) -> Result<(), HardwareFault> {
        self.with_usb(|usb, dp| usb.click(dp, button))
    }

    fn key_press(&mut self, key: Keycode) -> Result<(), HardwareFault> {
        self.with_usb(|usb, dp| usb.press_key(dp, key))
    }

    fn key_release(&mut self, key: Keycode) -> Result<(), HardwareFault> {
        self.with_usb(|usb, dp| usb.release_key(dp, key))
    }
}

/// Disable all peripherals and jump to the HalfKay bootloader at 0x7E00.
fn jump_to_bootloader(dp: &Peripherals) -> ! {
    avr_device::interrupt::disable();

    // Disconnect USB
    dp.USB_DEVICE.udcon.write(|w| w.detach().set_bit());
    dp.USB_DEVICE.usbcon.write(|w| w.frzclk().set_bit());

    // Give the host time to notice the disconnect
    for _ in 0..20000u16 {
        unsafe { core::arch::asm!("nop") };
    }

    // Peripherals this firmware turns on
    dp.TC0.timsk0.write(|w| unsafe { w.bits(0) });
    dp.TC0.tccr0b.write(|w| unsafe { w.bits(0) });
    dp.USART1.ucsr1b.write(|w| unsafe { w.bits(0) });
    dp.PORTB.ddrb.write(|w| unsafe { w.bits(0) });
    dp.PORTB.portb.write(|w| unsafe { w.bits(0) });
    dp.PORTD.ddrd.write(|w| unsafe { w.bits(0) });
    dp.PORTD.portd.write(|w| unsafe { w.bits(0) });

    unsafe { core::arch::asm!("jmp 0x7E00", options(noreturn)) }
}
