// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

const PAGE_MASK: u16 = 0xFF00;
const OFFSET_MASK: u16 = 0x00FF;

/// Returns the address after `addr` without carrying into the next page, so
/// $02FF is followed by $0200. The 2A03 fetches the high byte of an indirect
/// jump target this way.
#[inline(always)]
pub fn next_in_page(addr: u16) -> u16 {
    (addr & PAGE_MASK) | (addr.wrapping_add(1) & OFFSET_MASK)
}

/// Returns the address after `addr` inside of the zero page, so $FF is
/// followed by $00. Only the low byte of `addr` is significant.
#[inline(always)]
pub fn next_in_zero_page(addr: u16) -> u16 {
    addr.wrapping_add(1) & OFFSET_MASK
}
