//! SetupAPI device-class enumeration (keyboards and mice).

#![cfg(target_os = "windows")]

use crate::record::{DeviceClass, DeviceClassRecord};
use std::io;
use windows_sys::core::GUID;
use windows_sys::Win32::Devices::DeviceAndDriverInstallation::{
    SetupDiDestroyDeviceInfoList, SetupDiEnumDeviceInfo, SetupDiGetClassDevsW,
    SetupDiGetDeviceInstanceIdW, SetupDiGetDeviceRegistryPropertyW, DIGCF_PRESENT,
    SPDRP_DEVICEDESC, SP_DEVINFO_DATA,
};
use windows_sys::Win32::Foundation::ERROR_NO_MORE_ITEMS;

/// `GUID_DEVCLASS_KEYBOARD`
const KEYBOARD_CLASS: GUID = GUID::from_u128(0x4d36e96b_e325_11ce_bfc1_08002be10318);
/// `GUID_DEVCLASS_MOUSE`
const MOUSE_CLASS: GUID = GUID::from_u128(0x4d36e96f_e325_11ce_bfc1_08002be10318);

/// Keyboards first, then mice, each in SetupAPI order.
pub(crate) fn enumerate_input_classes() -> io::Result<Vec<DeviceClassRecord>> {
    let mut out = Vec::new();
    enumerate_class(&KEYBOARD_CLASS, DeviceClass::Keyboard, &mut out)?;
    enumerate_class(&MOUSE_CLASS, DeviceClass::Mouse, &mut out)?;
    Ok(out)
}

fn wide_to_string(mut wide: Vec<u16>) -> String {
    while wide.last() == Some(&0) {
        wide.pop();
    }
    String::from_utf16_lossy(&wide)
}

fn enumerate_class(
    guid: &GUID,
    class: DeviceClass,
    out: &mut Vec<DeviceClassRecord>,
) -> io::Result<()> {
    unsafe {
        let set = SetupDiGetClassDevsW(
            guid,
            core::ptr::null(),
            core::ptr::null_mut(),
            DIGCF_PRESENT,
        );
        if set as isize == -1 {
            return Err(io::Error::last_os_error());
        }

        let mut result = Ok(());
        let mut index = 0u32;
        loop {
            let mut data: SP_DEVINFO_DATA = core::mem::zeroed();
            data.cbSize = core::mem::size_of::<SP_DEVINFO_DATA>() as u32;
            if SetupDiEnumDeviceInfo(set, index, &mut data) == 0 {
                let err = io::Error::last_os_error();
                if err.raw_os_error() != Some(ERROR_NO_MORE_ITEMS as i32) {
                    result = Err(err);
                }
                break;
            }
            index += 1;

            let mut id_len: u32 = 0;
            SetupDiGetDeviceInstanceIdW(set, &data, core::ptr::null_mut(), 0, &mut id_len);
            if id_len == 0 {
                continue;
            }
            let mut id = vec![0u16; id_len as usize];
            if SetupDiGetDeviceInstanceIdW(set, &data, id.as_mut_ptr(), id_len, core::ptr::null_mut())
                == 0
            {
                result = Err(io::Error::last_os_error());
                break;
            }

            let mut desc_len: u32 = 0;
            SetupDiGetDeviceRegistryPropertyW(
                set,
                &data,
                SPDRP_DEVICEDESC,
                core::ptr::null_mut(),
                core::ptr::null_mut(),
                0,
                &mut desc_len,
            );
            let mut desc = vec![0u16; (desc_len as usize).div_ceil(2).max(1)];
            let description = if desc_len > 0
                && SetupDiGetDeviceRegistryPropertyW(
                    set,
                    &data,
                    SPDRP_DEVICEDESC,
                    core::ptr::null_mut(),
                    desc.as_mut_ptr() as *mut u8,
                    (desc.len() * 2) as u32,
                    core::ptr::null_mut(),
                ) != 0
            {
                wide_to_string(desc)
            } else {
                String::new()
            };

            out.push(DeviceClassRecord::new(wide_to_string(id), description, class));
        }

        SetupDiDestroyDeviceInfoList(set);
        result
    }
}
